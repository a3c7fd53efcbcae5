//! Store and engine configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How `set_ref` treats a header whose `previous` is not the current head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppendPolicy {
    /// `previous` must equal the ref's current head (compare-and-swap).
    /// The ref must already exist.
    #[default]
    Strict,
    /// `previous` only has to be some stored chain header. Two appends from
    /// the same stale head both succeed and the last commit wins the pointer.
    Permissive,
}

/// Configuration for object and ref stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Root key prefix. A trailing `/` is added if missing.
    pub prefix: String,
    /// Append policy for `set_ref`.
    pub append_policy: AppendPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            prefix: "thrap/".to_string(),
            append_policy: AppendPolicy::Strict,
        }
    }
}

impl StoreConfig {
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_append_policy(mut self, policy: AppendPolicy) -> Self {
        self.append_policy = policy;
        self
    }
}

/// Configuration for the SQLite engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
    /// Database file. `None` opens an in-memory database.
    pub path: Option<PathBuf>,
    /// `PRAGMA synchronous = FULL` so a committed write survives a crash.
    pub sync_writes: bool,
    /// How long to wait on a locked database before failing.
    pub busy_timeout_ms: u64,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: None,
            sync_writes: true,
            busy_timeout_ms: 5_000,
        }
    }
}

impl SqliteConfig {
    /// File-backed configuration with default settings.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.prefix, "thrap/");
        assert_eq!(config.append_policy, AppendPolicy::Strict);

        let sqlite = SqliteConfig::default();
        assert!(sqlite.path.is_none());
        assert!(sqlite.sync_writes);
        assert_eq!(sqlite.busy_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_config_from_json() {
        let config: StoreConfig =
            serde_json::from_str(r#"{"append_policy":"permissive"}"#).unwrap();
        assert_eq!(config.append_policy, AppendPolicy::Permissive);
        assert_eq!(config.prefix, "thrap/");

        let sqlite: SqliteConfig =
            serde_json::from_str(r#"{"path":"/var/lib/thrap/db","sync_writes":false}"#).unwrap();
        assert_eq!(sqlite.path, Some(PathBuf::from("/var/lib/thrap/db")));
        assert!(!sqlite.sync_writes);
        assert_eq!(sqlite.busy_timeout_ms, 5_000);
    }
}

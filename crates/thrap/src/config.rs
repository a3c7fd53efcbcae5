//! Top-level configuration.

use serde::{Deserialize, Serialize};
use thrap_core::{Blake3Digester, CborCodec};
use thrap_store::{RefStore, SqliteConfig, SqliteEngine, StoreConfig};

use crate::error::Result;

/// Everything needed to open a persistent store.
///
/// Both sections default, so an empty document yields an in-memory SQLite
/// database with strict appends under the `thrap/` prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrapConfig {
    pub store: StoreConfig,
    pub sqlite: SqliteConfig,
}

impl ThrapConfig {
    /// Open the SQLite engine and wrap it in a ref store.
    pub fn open(&self) -> Result<RefStore<SqliteEngine>> {
        let engine = SqliteEngine::with_config(&self.sqlite)?;
        tracing::debug!(
            path = ?self.sqlite.path,
            prefix = %self.store.prefix,
            policy = ?self.store.append_policy,
            "opened thrap store"
        );
        Ok(RefStore::with_parts(
            engine,
            Blake3Digester,
            CborCodec,
            &self.store,
        ))
    }
}

//! Error types for typed record storage.

use thiserror::Error;
use thrap_store::StoreError;

/// Errors that can occur during record operations.
#[derive(Debug, Error)]
pub enum ThrapError {
    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// `create` on a name that is already taken.
    #[error("record already exists: {0}")]
    RecordExists(String),

    /// No record, or a record that was never given a payload.
    #[error("record not found: {0}")]
    RecordNotFound(String),

    /// Another writer moved the record's head first.
    #[error("conflicting update on {name}: {reason}")]
    Conflict { name: String, reason: String },

    /// The blocking task running a store operation panicked or was cancelled.
    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ThrapError {
    /// Translate a ref-level error into the record vocabulary for `name`.
    pub(crate) fn for_record(name: &str, err: StoreError) -> Self {
        match err {
            StoreError::RefExists { .. } => ThrapError::RecordExists(name.to_string()),
            StoreError::RefNotFound { .. } => ThrapError::RecordNotFound(name.to_string()),
            StoreError::HeadMismatch { .. } => ThrapError::Conflict {
                name: name.to_string(),
                reason: err.to_string(),
            },
            other => ThrapError::Store(other),
        }
    }
}

/// Result type for record operations.
pub type Result<T> = std::result::Result<T, ThrapError>;

#[cfg(test)]
mod tests {
    use super::*;
    use thrap_core::Digest;

    #[test]
    fn test_ref_errors_become_record_errors() {
        let exists = StoreError::RefExists {
            namespace: "stacks".into(),
            name: "app1".into(),
        };
        assert!(matches!(
            ThrapError::for_record("app1", exists),
            ThrapError::RecordExists(name) if name == "app1"
        ));

        let mismatch = StoreError::HeadMismatch {
            namespace: "stacks".into(),
            name: "app1".into(),
            current: Digest::from([1u8; 4]),
            previous: Digest::from([2u8; 4]),
        };
        match ThrapError::for_record("app1", mismatch) {
            ThrapError::Conflict { name, reason } => {
                assert_eq!(name, "app1");
                assert!(reason.contains("head mismatch"));
            }
            other => panic!("expected Conflict, got {other:?}"),
        }

        let missing_object = StoreError::ObjectNotFound {
            namespace: "stacks".into(),
            digest: Digest::from([3u8; 4]),
        };
        assert!(matches!(
            ThrapError::for_record("app1", missing_object),
            ThrapError::Store(StoreError::ObjectNotFound { .. })
        ));
    }
}

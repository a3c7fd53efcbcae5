//! Error types for the store module.

use thiserror::Error;

use thrap_core::{CoreError, Digest};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `create_ref` on a name that already has a pointer.
    #[error("ref already exists: {namespace}/{name}")]
    RefExists { namespace: String, name: String },

    /// `put` of content whose digest is already stored.
    #[error("object already exists: {namespace}/{digest}")]
    ObjectExists { namespace: String, digest: Digest },

    /// No pointer for this ref.
    #[error("ref not found: {namespace}/{name}")]
    RefNotFound { namespace: String, name: String },

    /// No object (or chain predecessor) at this digest.
    #[error("object not found: {namespace}/{digest}")]
    ObjectNotFound { namespace: String, digest: Digest },

    /// Stored bytes could not be decoded into the expected shape.
    #[error("corrupt data at {key}: {reason}")]
    Corrupt { key: String, reason: String },

    /// Strict append whose `previous` is not the ref's current head.
    #[error("head mismatch on {namespace}/{name}: current head {current}, header extends {previous}")]
    HeadMismatch {
        namespace: String,
        name: String,
        current: Digest,
        previous: Digest,
    },

    /// A chain that violates the height or termination invariant.
    #[error("broken chain {namespace}/{name}: {reason}")]
    BrokenChain {
        namespace: String,
        name: String,
        reason: String,
    },

    /// Namespace or ref name rejected by validation.
    #[error("invalid name: {0}")]
    InvalidName(CoreError),

    /// Value could not be serialized for writing.
    #[error("encoding error: {0}")]
    Encoding(CoreError),

    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A lock guarding the engine was poisoned by a panicking writer.
    #[error("engine lock poisoned: {0}")]
    Poisoned(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether this is a missing ref, object, or predecessor.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::RefNotFound { .. } | StoreError::ObjectNotFound { .. }
        )
    }

    /// Whether this is a write-once violation.
    pub fn is_exists(&self) -> bool {
        matches!(
            self,
            StoreError::RefExists { .. } | StoreError::ObjectExists { .. }
        )
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

//! Error types for Thrap Core.

use thiserror::Error;

/// Errors produced by the pure primitives in this crate.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("decoding error: {0}")]
    Decoding(String),

    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    #[error("invalid digest: {0}")]
    InvalidDigest(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

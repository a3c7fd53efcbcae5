//! # Thrap
//!
//! Versioned record storage: every record is a hash-linked history of
//! immutable versions kept in an embedded transactional database.
//!
//! ## Overview
//!
//! - **Objects**: write-once values addressed by the digest of their bytes
//! - **Refs**: named pointers to the newest header of a chain
//! - **Records**: typed values whose versions are the headers of one ref
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use serde::{Deserialize, Serialize};
//! use thrap::{ChainedRecords, Object, RecordStorage, ThrapConfig};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct Stack {
//!     id: String,
//! }
//!
//! impl Object for Stack {}
//!
//! async fn example() {
//!     let store = Arc::new(ThrapConfig::default().open().unwrap());
//!     let stacks: ChainedRecords<Stack, _> = ChainedRecords::new(store, "stacks").unwrap();
//!
//!     let v1 = stacks.create("app1", Stack { id: "app1".into() }).await.unwrap();
//!     let v2 = stacks.update("app1", Stack { id: "app1".into() }).await.unwrap();
//!     assert_eq!((v1.height, v2.height), (1, 2));
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `thrap::core` - digests, codecs, chain headers, name validation
//! - `thrap::store` - engines, the object layer, and the ref layer

pub mod config;
pub mod error;
pub mod records;

// Re-export component crates
pub use thrap_core as core;
pub use thrap_store as store;

// Re-export main types for convenience
pub use config::ThrapConfig;
pub use error::{Result, ThrapError};
pub use records::{ChainedRecords, RecordStorage, Version};

// Re-export commonly used lower-level types
pub use thrap_core::{ChainHeader, Digest, Object};
pub use thrap_store::{AppendPolicy, MemoryEngine, RefStore, SqliteEngine, StoreConfig};

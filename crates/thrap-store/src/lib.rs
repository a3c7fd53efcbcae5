//! # Thrap Store
//!
//! Versioned record storage over a transactional key-value engine.
//!
//! ## Overview
//!
//! Two layers share one engine:
//!
//! - the **object layer** ([`ObjectStore`]) keeps write-once values keyed by
//!   the digest of their encoded bytes, scoped by namespace;
//! - the **ref layer** ([`RefStore`]) keeps named pointers to the newest
//!   [`ChainHeader`](thrap_core::ChainHeader) of a hash-linked history.
//!
//! Engines implement [`KvEngine`]. [`SqliteEngine`] is the persistent
//! backend and [`MemoryEngine`] is for tests.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use thrap_core::ChainHeader;
//! use thrap_store::{RefStore, SqliteEngine};
//!
//! let store = RefStore::new(SqliteEngine::open("thrap.db").unwrap());
//!
//! let (genesis, _) = store.create_ref("stacks", "app1").unwrap();
//! let payload = store.objects().put_blob("stacks", b"v1".to_vec()).unwrap();
//! let (head, header) = store
//!     .set_ref("stacks", "app1", ChainHeader::new(genesis, payload))
//!     .unwrap();
//! assert_eq!(header.height, 1);
//!
//! store
//!     .iter_ref_chain("stacks", "app1", |digest, header| {
//!         println!("{} @ {}", digest, header.height);
//!         Ok::<_, thrap_store::StoreError>(())
//!     })
//!     .unwrap();
//! # let _ = head;
//! ```
//!
//! ## Design Notes
//!
//! - **Write-once objects**: putting an existing digest returns `ObjectExists`
//! - **One transaction per operation**: every check and its write commit together
//! - **Strict appends by default**: a new header must extend the current head
//! - **Bounded walks**: traversal stops with `BrokenChain` instead of looping

pub mod config;
pub mod error;
pub mod keys;
pub mod memory;
pub mod migration;
pub mod objects;
pub mod refs;
pub mod sqlite;
pub mod traits;

pub use config::{AppendPolicy, SqliteConfig, StoreConfig};
pub use error::{Result, StoreError};
pub use keys::KeySpace;
pub use memory::MemoryEngine;
pub use objects::ObjectStore;
pub use refs::RefStore;
pub use sqlite::SqliteEngine;
pub use traits::{KvEngine, ReadTxn, WriteTxn};

//! # Thrap Testkit
//!
//! Testing utilities for thrap stores.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: ready-made ref stores (in memory or in a temporary
//!   SQLite file) with helpers for building chains
//! - **Generators**: proptest strategies for names, digests, and chains
//!
//! ## Test Fixtures
//!
//! ```rust
//! use thrap_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::new();
//! let digests = fixture.build_chain("stacks", "app1", &[b"v1", b"v2"]);
//! assert_eq!(digests.len(), 3);
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use thrap_testkit::{ChainParams, TestFixture};
//!
//! proptest! {
//!     #[test]
//!     fn head_height_matches_length(params: ChainParams) {
//!         let fixture = TestFixture::new();
//!         let digests = fixture.build_chain_from(&params);
//!         prop_assert_eq!(digests.len(), params.payloads.len() + 1);
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{Record, TestFixture};
pub use generators::ChainParams;

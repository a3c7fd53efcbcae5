//! # Thrap Core
//!
//! Pure primitives for the Thrap record store: digests, hash adapters,
//! codecs, and the chain header that links one version of a record to the
//! previous one.
//!
//! This crate contains no I/O and no storage. It is pure computation over
//! byte strings.
//!
//! ## Key Types
//!
//! - [`Digest`] - Content address of a serialized object
//! - [`Digester`] - Pluggable hash function ([`Blake3Digester`], [`Blake2bDigester`])
//! - [`Codec`] - Pluggable serialization ([`CborCodec`], [`JsonCodec`])
//! - [`Object`] - Capability implemented by anything the store persists
//! - [`ChainHeader`] - Per-version metadata in a ref's history
//!
//! ## Digesting
//!
//! An object's digest is always `digester.digest(object.to_bytes(codec))`.
//! Both the digester and the codec are injected by the caller, so the same
//! types can be stored under different hash functions or encodings.

pub mod codec;
pub mod digest;
pub mod error;
pub mod header;
pub mod names;
pub mod object;

pub use codec::{CborCodec, Codec, JsonCodec};
pub use digest::{Blake2bDigester, Blake3Digester, Digest, Digester};
pub use error::{CoreError, Result};
pub use header::{now_nanos, ChainHeader};
pub use names::{validate_namespace, validate_ref_name};
pub use object::{Blob, Object};

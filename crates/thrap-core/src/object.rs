//! The [`Object`] capability.
//!
//! Anything persisted through the object layer implements [`Object`]: it can
//! be serialized deterministically, hashed to a digest, and decoded back.
//! The default methods delegate to the injected [`Codec`]; types with their
//! own wire form (like [`Blob`]) override them.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::codec::Codec;
use crate::digest::{Digest, Digester};
use crate::error::Result;

/// A hashable, serializable payload.
pub trait Object: Serialize + DeserializeOwned {
    /// Serialize to the bytes that get stored and hashed.
    fn to_bytes<C: Codec>(&self, codec: &C) -> Result<Vec<u8>> {
        codec.encode(self)
    }

    /// Decode from stored bytes.
    fn from_bytes<C: Codec>(codec: &C, bytes: &[u8]) -> Result<Self> {
        codec.decode(bytes)
    }

    /// Content digest: the hash of [`Object::to_bytes`].
    fn digest_with<C: Codec, D: Digester + ?Sized>(
        &self,
        codec: &C,
        digester: &D,
    ) -> Result<Digest> {
        Ok(digester.digest(&self.to_bytes(codec)?))
    }
}

/// Opaque bytes stored verbatim, bypassing the codec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob(pub Bytes);

impl Blob {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self(data.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Object for Blob {
    fn to_bytes<C: Codec>(&self, _codec: &C) -> Result<Vec<u8>> {
        Ok(self.0.to_vec())
    }

    fn from_bytes<C: Codec>(_codec: &C, bytes: &[u8]) -> Result<Self> {
        Ok(Self(Bytes::copy_from_slice(bytes)))
    }
}

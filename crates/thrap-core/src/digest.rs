//! Digests and the pluggable hash functions that produce them.
//!
//! A [`Digest`] is a variable-length byte string whose length is fixed by the
//! [`Digester`] that produced it. The store never assumes a particular hash
//! function; it only asks the digester for its output length (to build the
//! zero sentinel) and for the digest of a byte string.

use blake2::{Blake2b512, Digest as _};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// A content digest.
///
/// Serialized as a byte string, so CBOR encodes it compactly.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Digest(Bytes);

impl Digest {
    /// Create a digest from raw bytes.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// The all-zero digest of the given length.
    ///
    /// Used as the "no predecessor" sentinel in chain headers.
    pub fn zero(len: usize) -> Self {
        Self(Bytes::from(vec![0u8; len]))
    }

    /// Whether every byte is zero.
    ///
    /// An empty digest counts as zero.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the digest has no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let bytes = hex::decode(s).map_err(|e| CoreError::InvalidDigest(e.to_string()))?;
        Ok(Self(Bytes::from(bytes)))
    }

    fn short_hex(&self) -> String {
        let hex = self.to_hex();
        hex[..hex.len().min(16)].to_string()
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.short_hex())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_hex())
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Digest {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Bytes::from(bytes))
    }
}

impl From<&[u8]> for Digest {
    fn from(bytes: &[u8]) -> Self {
        Self(Bytes::copy_from_slice(bytes))
    }
}

impl<const N: usize> From<[u8; N]> for Digest {
    fn from(bytes: [u8; N]) -> Self {
        Self(Bytes::copy_from_slice(&bytes))
    }
}

/// A hash function adapter.
///
/// Injected into the store at construction so the digest algorithm is never
/// hard-coded.
pub trait Digester: Send + Sync {
    /// Number of bytes in every digest this function produces.
    fn output_len(&self) -> usize;

    /// Hash the given bytes.
    fn digest(&self, data: &[u8]) -> Digest;

    /// The zero sentinel sized to this hash function.
    fn zero_digest(&self) -> Digest {
        Digest::zero(self.output_len())
    }
}

/// Blake3, 32-byte output. The default digester.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Digester;

impl Digester for Blake3Digester {
    fn output_len(&self) -> usize {
        blake3::OUT_LEN
    }

    fn digest(&self, data: &[u8]) -> Digest {
        Digest::from(*blake3::hash(data).as_bytes())
    }
}

/// BLAKE2b-512, 64-byte output.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake2bDigester;

impl Digester for Blake2bDigester {
    fn output_len(&self) -> usize {
        64
    }

    fn digest(&self, data: &[u8]) -> Digest {
        let mut hasher = Blake2b512::new();
        hasher.update(data);
        Digest::from(hasher.finalize().to_vec())
    }
}

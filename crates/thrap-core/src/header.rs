//! Chain headers: the versioned metadata unit of a ref's history.
//!
//! Each header links one version to its predecessor by digest and names the
//! digest of the payload it represents. Headers are stored as ordinary
//! objects, keyed by their own digest, so a ref's history is a backward
//! linked list that ends at a genesis header whose `previous` is the zero
//! digest.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::digest::Digest;
use crate::object::Object;

/// One entry in a ref's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainHeader {
    /// Digest of the prior header. All zeros at genesis.
    pub previous: Digest,

    /// Creation time of this version (nanoseconds since the Unix epoch).
    pub timestamp: i64,

    /// Digest of the payload this version represents. All zeros at genesis.
    pub data_digest: Digest,

    /// Version number: 0 at genesis, predecessor + 1 afterwards.
    ///
    /// Assigned by the store on append; whatever the caller sets is replaced.
    pub height: u64,
}

impl ChainHeader {
    /// The first header of a new ref.
    pub fn genesis(digest_len: usize) -> Self {
        Self {
            previous: Digest::zero(digest_len),
            timestamp: now_nanos(),
            data_digest: Digest::zero(digest_len),
            height: 0,
        }
    }

    /// A header extending `previous` with a new payload, stamped now.
    pub fn new(previous: Digest, data_digest: Digest) -> Self {
        Self {
            previous,
            timestamp: now_nanos(),
            data_digest,
            height: 0,
        }
    }

    /// Override the timestamp.
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Whether this header has no predecessor.
    pub fn is_genesis(&self) -> bool {
        self.previous.is_zero()
    }

    /// Whether this header carries a payload digest.
    pub fn has_data(&self) -> bool {
        !self.data_digest.is_zero()
    }
}

impl Object for ChainHeader {}

/// Current time in nanoseconds since the Unix epoch.
pub fn now_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{CborCodec, Codec};
    use crate::digest::{Blake3Digester, Digester};

    #[test]
    fn test_genesis_header() {
        let header = ChainHeader::genesis(32);
        assert_eq!(header.height, 0);
        assert!(header.is_genesis());
        assert!(!header.has_data());
        assert_eq!(header.previous, Digest::zero(32));
        assert!(header.timestamp > 0);
    }

    #[test]
    fn test_new_header_points_back() {
        let prev = Blake3Digester.digest(b"prev");
        let data = Blake3Digester.digest(b"data");
        let header = ChainHeader::new(prev.clone(), data.clone());
        assert!(!header.is_genesis());
        assert!(header.has_data());
        assert_eq!(header.previous, prev);
        assert_eq!(header.data_digest, data);
    }

    #[test]
    fn test_header_digest_covers_every_field() {
        let base = ChainHeader::genesis(32).with_timestamp(1_000);
        let d = |h: &ChainHeader| h.digest_with(&CborCodec, &Blake3Digester).unwrap();

        let mut taller = base.clone();
        taller.height = 1;
        let later = base.clone().with_timestamp(1_001);

        assert_eq!(d(&base), d(&base.clone()));
        assert_ne!(d(&base), d(&taller));
        assert_ne!(d(&base), d(&later));
    }

    #[test]
    fn test_header_cbor_roundtrip() {
        let header = ChainHeader::new(Digest::from([7u8; 32]), Digest::from([9u8; 32]))
            .with_timestamp(42);
        let bytes = CborCodec.encode(&header).unwrap();
        let decoded: ChainHeader = CborCodec.decode(&bytes).unwrap();
        assert_eq!(decoded, header);
    }
}

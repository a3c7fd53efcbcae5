//! Pluggable serialization.
//!
//! A [`Codec`] turns serde types into bytes and back. Digests are computed
//! over the encoded bytes, so a codec must be deterministic: the same value
//! always encodes to the same bytes.
//!
//! - [`CborCodec`] - CBOR via ciborium. Struct fields are written in
//!   declaration order, byte strings stay byte strings. The default.
//! - [`JsonCodec`] - JSON via serde_json. Human-readable, larger.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CoreError, Result};

/// Serialization capability injected into the store.
pub trait Codec: Send + Sync {
    /// Encode a value to bytes.
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>>;

    /// Decode a value from bytes.
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T>;
}

/// CBOR codec backed by ciborium.
#[derive(Debug, Clone, Copy, Default)]
pub struct CborCodec;

impl Codec for CborCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf).map_err(|e| CoreError::Encoding(e.to_string()))?;
        Ok(buf)
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        ciborium::from_reader(bytes).map_err(|e| CoreError::Decoding(e.to_string()))
    }
}

/// JSON codec backed by serde_json.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| CoreError::Encoding(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).map_err(|e| CoreError::Decoding(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        version: u32,
    }

    fn sample() -> Sample {
        Sample {
            name: "app1".to_string(),
            version: 3,
        }
    }

    #[test]
    fn test_cbor_is_deterministic() {
        let a = CborCodec.encode(&sample()).unwrap();
        let b = CborCodec.encode(&sample()).unwrap();
        assert_eq!(a, b);
        let decoded: Sample = CborCodec.decode(&a).unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn test_json_decode() {
        let bytes = JsonCodec.encode(&sample()).unwrap();
        assert_eq!(bytes, br#"{"name":"app1","version":3}"#.to_vec());
        let decoded: Sample = JsonCodec.decode(&bytes).unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = CborCodec.decode::<Sample>(&[0xff, 0x00, 0x13]).unwrap_err();
        assert!(matches!(err, CoreError::Decoding(_)));

        let err = JsonCodec.decode::<Sample>(b"not json").unwrap_err();
        assert!(matches!(err, CoreError::Decoding(_)));
    }
}

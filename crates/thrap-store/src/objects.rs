//! The object layer: namespaced, content-addressed, write-once blobs.
//!
//! An object's key is the digest of its serialized bytes. `put` refuses to
//! overwrite an existing digest, `get` decodes into whatever [`Object`] type
//! the caller asks for, and `delete` removes the bytes without checking
//! whether any ref chain still points at them.

use bytes::Bytes;
use thrap_core::{
    validate_namespace, Blake3Digester, Blob, CborCodec, Codec, Digest, Digester, Object,
};

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::keys::KeySpace;
use crate::traits::{KvEngine, ReadTxn, WriteTxn};

/// Content-addressed object storage over a [`KvEngine`].
///
/// The engine handle, hash function, and codec are all owned by the store
/// and fixed for its lifetime.
pub struct ObjectStore<E, D = Blake3Digester, C = CborCodec> {
    engine: E,
    digester: D,
    codec: C,
    keys: KeySpace,
}

impl<E: KvEngine> ObjectStore<E> {
    /// Blake3 digests, CBOR encoding, default prefix.
    pub fn new(engine: E) -> Self {
        Self::with_parts(engine, Blake3Digester, CborCodec, &StoreConfig::default())
    }
}

impl<E, D, C> ObjectStore<E, D, C>
where
    E: KvEngine,
    D: Digester,
    C: Codec,
{
    pub fn with_parts(engine: E, digester: D, codec: C, config: &StoreConfig) -> Self {
        Self {
            engine,
            digester,
            codec,
            keys: KeySpace::new(&config.prefix),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn digester(&self) -> &D {
        &self.digester
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn keys(&self) -> &KeySpace {
        &self.keys
    }

    /// The digest `put` would assign to `object`, without writing it.
    pub fn digest_of<O: Object>(&self, object: &O) -> Result<Digest> {
        object
            .digest_with(&self.codec, &self.digester)
            .map_err(StoreError::Encoding)
    }

    /// Store an object, returning its digest.
    ///
    /// Fails with [`StoreError::ObjectExists`] if the digest is already
    /// present, even though the bytes are necessarily identical.
    pub fn put<O: Object>(&self, namespace: &str, object: &O) -> Result<Digest> {
        validate_namespace(namespace).map_err(StoreError::InvalidName)?;
        let bytes = object.to_bytes(&self.codec).map_err(StoreError::Encoding)?;
        let digest = self.digester.digest(&bytes);
        let key = self.keys.object_key(namespace, &digest);

        self.engine.update(|txn| {
            if txn.contains(&key)? {
                return Err(StoreError::ObjectExists {
                    namespace: namespace.to_string(),
                    digest: digest.clone(),
                });
            }
            txn.set(&key, &bytes)
        })?;

        tracing::debug!(namespace, digest = %digest, size = bytes.len(), "stored object");
        Ok(digest)
    }

    /// Load and decode the object at `digest`.
    pub fn get<O: Object>(&self, namespace: &str, digest: &Digest) -> Result<O> {
        validate_namespace(namespace).map_err(StoreError::InvalidName)?;
        self.engine.view(|txn| self.load_in(txn, namespace, digest))
    }

    /// Whether an object with this digest is stored.
    pub fn contains(&self, namespace: &str, digest: &Digest) -> Result<bool> {
        validate_namespace(namespace).map_err(StoreError::InvalidName)?;
        let key = self.keys.object_key(namespace, digest);
        self.engine.view(|txn| txn.contains(&key))
    }

    /// Remove an object. Missing objects are not an error.
    ///
    /// Chains that still reference the object become unreadable past it.
    pub fn delete(&self, namespace: &str, digest: &Digest) -> Result<()> {
        validate_namespace(namespace).map_err(StoreError::InvalidName)?;
        let key = self.keys.object_key(namespace, digest);
        self.engine.update(|txn| txn.delete(&key))?;
        tracing::debug!(namespace, digest = %digest, "deleted object");
        Ok(())
    }

    /// Store raw bytes verbatim.
    pub fn put_blob(&self, namespace: &str, data: impl Into<Bytes>) -> Result<Digest> {
        self.put(namespace, &Blob::new(data))
    }

    /// Load raw bytes stored with [`ObjectStore::put_blob`].
    pub fn get_blob(&self, namespace: &str, digest: &Digest) -> Result<Bytes> {
        Ok(self.get::<Blob>(namespace, digest)?.0)
    }

    /// Load an object inside an existing transaction.
    pub(crate) fn load_in<O, T>(&self, txn: &T, namespace: &str, digest: &Digest) -> Result<O>
    where
        O: Object,
        T: ReadTxn + ?Sized,
    {
        let key = self.keys.object_key(namespace, digest);
        let bytes = txn
            .get(&key)?
            .ok_or_else(|| StoreError::ObjectNotFound {
                namespace: namespace.to_string(),
                digest: digest.clone(),
            })?;
        O::from_bytes(&self.codec, &bytes).map_err(|e| StoreError::Corrupt {
            key: self.keys.object_label(namespace, digest),
            reason: e.to_string(),
        })
    }

    /// Write an object inside an existing transaction, overwriting any
    /// identical bytes already at its digest.
    pub(crate) fn store_in<O, T>(&self, txn: &mut T, namespace: &str, object: &O) -> Result<Digest>
    where
        O: Object,
        T: WriteTxn + ?Sized,
    {
        let bytes = object.to_bytes(&self.codec).map_err(StoreError::Encoding)?;
        let digest = self.digester.digest(&bytes);
        txn.set(&self.keys.object_key(namespace, &digest), &bytes)?;
        Ok(digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryEngine;
    use serde::{Deserialize, Serialize};
    use thrap_core::{Blake2bDigester, JsonCodec};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Profile {
        name: String,
        orchestrator: String,
    }

    impl Object for Profile {}

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Other {
        count: u64,
    }

    impl Object for Other {}

    fn profile() -> Profile {
        Profile {
            name: "local".into(),
            orchestrator: "docker".into(),
        }
    }

    #[test]
    fn test_put_and_get() {
        let store = ObjectStore::new(MemoryEngine::new());
        let digest = store.put("profiles", &profile()).unwrap();

        assert_eq!(digest, store.digest_of(&profile()).unwrap());
        assert_eq!(digest.len(), 32);
        let loaded: Profile = store.get("profiles", &digest).unwrap();
        assert_eq!(loaded, profile());
        assert!(store.contains("profiles", &digest).unwrap());
    }

    #[test]
    fn test_duplicate_put_is_rejected() {
        let store = ObjectStore::new(MemoryEngine::new());
        let first = store.put("profiles", &profile()).unwrap();

        let err = store.put("profiles", &profile()).unwrap_err();
        match err {
            StoreError::ObjectExists { namespace, digest } => {
                assert_eq!(namespace, "profiles");
                assert_eq!(digest, first);
            }
            other => panic!("expected ObjectExists, got {other:?}"),
        }
    }

    #[test]
    fn test_same_content_in_other_namespace() {
        let store = ObjectStore::new(MemoryEngine::new());
        let a = store.put("tenant-a", &profile()).unwrap();
        let b = store.put("tenant-b", &profile()).unwrap();
        assert_eq!(a, b);

        store.delete("tenant-a", &a).unwrap();
        assert!(!store.contains("tenant-a", &a).unwrap());
        assert!(store.contains("tenant-b", &b).unwrap());
    }

    #[test]
    fn test_get_missing() {
        let store = ObjectStore::new(MemoryEngine::new());
        let missing = Blake3Digester.digest(b"nothing here");
        let err = store.get::<Profile>("profiles", &missing).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_get_wrong_shape_is_corrupt() {
        let store = ObjectStore::new(MemoryEngine::new());
        let digest = store.put("profiles", &profile()).unwrap();

        let err = store.get::<Other>("profiles", &digest).unwrap_err();
        match err {
            StoreError::Corrupt { key, .. } => {
                assert!(key.starts_with("thrap/profiles/objects/"));
                assert!(key.ends_with(&digest.to_hex()));
            }
            other => panic!("expected Corrupt, got {other:?}"),
        }
    }

    #[test]
    fn test_delete_is_unconditional() {
        let store = ObjectStore::new(MemoryEngine::new());
        let digest = store.put("profiles", &profile()).unwrap();

        store.delete("profiles", &digest).unwrap();
        store.delete("profiles", &digest).unwrap();
        assert!(store.get::<Profile>("profiles", &digest).unwrap_err().is_not_found());

        // Write-once only applies while the object exists.
        assert_eq!(store.put("profiles", &profile()).unwrap(), digest);
    }

    #[test]
    fn test_blob_roundtrip() {
        let store = ObjectStore::new(MemoryEngine::new());
        let digest = store.put_blob("artifacts", b"FROM alpine".to_vec()).unwrap();
        assert_eq!(digest, Blake3Digester.digest(b"FROM alpine"));
        assert_eq!(
            store.get_blob("artifacts", &digest).unwrap(),
            Bytes::from_static(b"FROM alpine")
        );
    }

    #[test]
    fn test_injected_digester_and_codec() {
        let store = ObjectStore::with_parts(
            MemoryEngine::new(),
            Blake2bDigester,
            JsonCodec,
            &StoreConfig::default(),
        );
        let digest = store.put("profiles", &profile()).unwrap();
        assert_eq!(digest.len(), 64);

        let json = serde_json::to_vec(&profile()).unwrap();
        assert_eq!(digest, Blake2bDigester.digest(&json));
        assert_eq!(store.get::<Profile>("profiles", &digest).unwrap(), profile());
    }

    #[test]
    fn test_invalid_namespace() {
        let store = ObjectStore::new(MemoryEngine::new());
        let err = store.put("a/b", &profile()).unwrap_err();
        assert!(matches!(err, StoreError::InvalidName(_)));
    }
}

//! Test fixtures and helpers.
//!
//! Common setup code for store and record tests.

use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use thrap_core::{ChainHeader, Digest, Object};
use thrap_store::{
    AppendPolicy, KvEngine, MemoryEngine, RefStore, SqliteEngine, StoreConfig, StoreError,
};

use crate::generators::ChainParams;

/// A small record type for exercising typed storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub revision: u32,
    pub tags: Vec<String>,
}

impl Record {
    pub fn new(id: &str, revision: u32) -> Self {
        Self {
            id: id.to_string(),
            revision,
            tags: Vec::new(),
        }
    }
}

impl Object for Record {}

/// A ref store plus whatever keeps its backing storage alive.
pub struct TestFixture<E: KvEngine = MemoryEngine> {
    pub store: RefStore<E>,
    dir: Option<TempDir>,
}

impl TestFixture<MemoryEngine> {
    /// In-memory store with strict appends.
    pub fn new() -> Self {
        Self {
            store: RefStore::new(MemoryEngine::new()),
            dir: None,
        }
    }

    /// In-memory store with permissive appends.
    pub fn permissive() -> Self {
        let config = StoreConfig::default().with_append_policy(AppendPolicy::Permissive);
        Self {
            store: RefStore::with_parts(
                MemoryEngine::new(),
                thrap_core::Blake3Digester,
                thrap_core::CborCodec,
                &config,
            ),
            dir: None,
        }
    }
}

impl Default for TestFixture<MemoryEngine> {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixture<SqliteEngine> {
    /// SQLite store in a fresh temporary directory, removed on drop.
    pub fn sqlite() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let engine = SqliteEngine::open(dir.path().join("thrap.db")).expect("open sqlite");
        Self {
            store: RefStore::new(engine),
            dir: Some(dir),
        }
    }

    /// Drop the engine and open the same database file again.
    pub fn reopen(self) -> Self {
        let dir = self.dir.expect("sqlite fixture has a directory");
        drop(self.store);
        let engine = SqliteEngine::open(dir.path().join("thrap.db")).expect("reopen sqlite");
        Self {
            store: RefStore::new(engine),
            dir: Some(dir),
        }
    }
}

impl<E: KvEngine> TestFixture<E> {
    /// Create a ref and return its genesis digest.
    pub fn create(&self, namespace: &str, name: &str) -> Digest {
        self.store
            .create_ref(namespace, name)
            .expect("create ref")
            .0
    }

    /// Store `payload` (reusing an identical one) and append it to the ref.
    pub fn append(&self, namespace: &str, name: &str, payload: &[u8]) -> (Digest, ChainHeader) {
        let data = match self.store.objects().put_blob(namespace, payload.to_vec()) {
            Ok(digest) => digest,
            Err(StoreError::ObjectExists { digest, .. }) => digest,
            Err(e) => panic!("put payload: {e}"),
        };
        let head = self
            .store
            .head(namespace, name)
            .expect("read head")
            .expect("ref exists");
        self.store
            .set_ref(namespace, name, ChainHeader::new(head, data))
            .expect("append")
    }

    /// Create a ref and append one header per payload.
    ///
    /// Returns header digests oldest first, genesis included.
    pub fn build_chain(&self, namespace: &str, name: &str, payloads: &[&[u8]]) -> Vec<Digest> {
        let mut digests = vec![self.create(namespace, name)];
        for payload in payloads {
            digests.push(self.append(namespace, name, payload).0);
        }
        digests
    }

    /// [`TestFixture::build_chain`] driven by generated parameters.
    pub fn build_chain_from(&self, params: &ChainParams) -> Vec<Digest> {
        let payloads: Vec<&[u8]> = params.payloads.iter().map(Vec::as_slice).collect();
        self.build_chain(&params.namespace, &params.ref_name, &payloads)
    }

    /// Digests visited walking the ref from head to genesis.
    pub fn walk(&self, namespace: &str, name: &str) -> Vec<Digest> {
        self.store
            .ref_chain(namespace, name)
            .expect("walk chain")
            .into_iter()
            .map(|(digest, _)| digest)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_chain() {
        let fixture = TestFixture::new();
        let digests = fixture.build_chain("stacks", "app1", &[b"a", b"b", b"c"]);
        assert_eq!(digests.len(), 4);

        let mut walked = fixture.walk("stacks", "app1");
        walked.reverse();
        assert_eq!(walked, digests);

        let (head, _) = fixture.store.get_ref("stacks", "app1").unwrap();
        assert_eq!(head.height, 3);
    }

    #[test]
    fn test_repeated_payloads_are_reused() {
        let fixture = TestFixture::new();
        let digests = fixture.build_chain("stacks", "app1", &[b"same", b"same"]);
        assert_eq!(digests.len(), 3);
        assert_ne!(digests[1], digests[2]);
    }

    #[test]
    fn test_sqlite_fixture_reopens() {
        let fixture = TestFixture::sqlite();
        let digests = fixture.build_chain("stacks", "app1", &[b"v1"]);

        let fixture = fixture.reopen();
        assert_eq!(fixture.store.head("stacks", "app1").unwrap(), digests.last().cloned());
        assert_eq!(fixture.store.verify_ref_chain("stacks", "app1").unwrap(), 2);
    }

    #[test]
    fn test_permissive_fixture() {
        let fixture = TestFixture::permissive();
        assert_eq!(fixture.store.policy(), AppendPolicy::Permissive);
    }
}

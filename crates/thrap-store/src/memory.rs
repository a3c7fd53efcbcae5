//! In-memory implementation of the engine traits.
//!
//! This is primarily for testing. It has the same transactional semantics
//! as SQLite but keeps everything in a `BTreeMap` with no persistence.
//! Writes are staged in an overlay and applied only when the closure
//! succeeds.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::traits::{KvEngine, ReadTxn, WriteTxn};

type Map = BTreeMap<Vec<u8>, Vec<u8>>;

/// In-memory engine.
///
/// All data is lost when the engine is dropped. Thread-safe via RwLock;
/// readers run concurrently, writers are exclusive.
#[derive(Debug, Default)]
pub struct MemoryEngine {
    data: RwLock<Map>,
}

impl MemoryEngine {
    /// Create a new empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.data.read().map(|d| d.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned(e: impl std::fmt::Display) -> StoreError {
    StoreError::Poisoned(e.to_string())
}

fn scan(map: &Map, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
    map.range(prefix.to_vec()..)
        .take_while(|(k, _)| k.starts_with(prefix))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

impl KvEngine for MemoryEngine {
    fn view<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn ReadTxn) -> Result<T>,
    {
        let data = self.data.read().map_err(poisoned)?;
        let txn = Snapshot { data: &data };
        f(&txn)
    }

    fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn WriteTxn) -> Result<T>,
    {
        let mut data = self.data.write().map_err(poisoned)?;
        let (outcome, staged) = {
            let mut txn = Overlay {
                base: &data,
                staged: BTreeMap::new(),
            };
            let outcome = f(&mut txn);
            (outcome, txn.staged)
        };

        let value = outcome?;
        for (key, change) in staged {
            match change {
                Some(bytes) => {
                    data.insert(key, bytes);
                }
                None => {
                    data.remove(&key);
                }
            }
        }
        Ok(value)
    }
}

/// Read-only view of the committed map.
struct Snapshot<'a> {
    data: &'a Map,
}

impl ReadTxn for Snapshot<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.data.get(key).cloned())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        Ok(scan(self.data, prefix))
    }
}

/// Uncommitted writes layered over the committed map.
///
/// `None` in `staged` marks a deletion.
struct Overlay<'a> {
    base: &'a Map,
    staged: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl ReadTxn for Overlay<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.staged.get(key) {
            Some(change) => Ok(change.clone()),
            None => Ok(self.base.get(key).cloned()),
        }
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut merged: Map = scan(self.base, prefix).into_iter().collect();
        let staged = self
            .staged
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix));
        for (key, change) in staged {
            match change {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        Ok(merged.into_iter().collect())
    }
}

impl WriteTxn for Overlay<'_> {
    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.staged.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.staged.insert(key.to_vec(), None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_delete() {
        let engine = MemoryEngine::new();
        engine.update(|txn| txn.set(b"a", b"1")).unwrap();
        assert_eq!(engine.view(|txn| txn.get(b"a")).unwrap(), Some(b"1".to_vec()));

        engine.update(|txn| txn.delete(b"a")).unwrap();
        assert_eq!(engine.view(|txn| txn.get(b"a")).unwrap(), None);
        assert!(engine.is_empty());
    }

    #[test]
    fn test_failed_update_applies_nothing() {
        let engine = MemoryEngine::new();
        engine.update(|txn| txn.set(b"kept", b"1")).unwrap();

        let result: Result<()> = engine.update(|txn| {
            txn.set(b"dropped", b"2")?;
            txn.delete(b"kept")?;
            Err(StoreError::Migration("abort".into()))
        });
        assert!(result.is_err());
        assert_eq!(engine.len(), 1);
        assert_eq!(engine.view(|txn| txn.get(b"kept")).unwrap(), Some(b"1".to_vec()));
    }

    #[test]
    fn test_overlay_reads_own_writes() {
        let engine = MemoryEngine::new();
        engine.update(|txn| txn.set(b"p/old", b"0")).unwrap();

        let scanned = engine
            .update(|txn| {
                txn.set(b"p/new", b"1")?;
                txn.delete(b"p/old")?;
                assert_eq!(txn.get(b"p/new")?, Some(b"1".to_vec()));
                assert!(!txn.contains(b"p/old")?);
                txn.scan_prefix(b"p/")
            })
            .unwrap();
        assert_eq!(scanned, vec![(b"p/new".to_vec(), b"1".to_vec())]);
    }

    #[test]
    fn test_scan_prefix_is_ordered_and_bounded() {
        let engine = MemoryEngine::new();
        engine
            .update(|txn| {
                txn.set(b"p/b", b"2")?;
                txn.set(b"p/a", b"1")?;
                txn.set(b"q/a", b"3")
            })
            .unwrap();
        let keys: Vec<Vec<u8>> = engine
            .view(|txn| txn.scan_prefix(b"p/"))
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec![b"p/a".to_vec(), b"p/b".to_vec()]);
    }
}

//! Engine traits: the transactional key-value interface the store runs on.
//!
//! The object and ref layers never touch a database directly. Every
//! operation is a closure handed to [`KvEngine::view`] or
//! [`KvEngine::update`]; the engine runs it inside one transaction and
//! commits only if the closure returns `Ok`. Implementations include SQLite
//! (primary) and in-memory (for tests).

use crate::error::Result;

/// Read access inside a transaction.
///
/// Keys and values are opaque byte strings.
pub trait ReadTxn {
    /// Point lookup by exact key.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Whether a key is present.
    fn contains(&self, key: &[u8]) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// All `(key, value)` pairs whose key starts with `prefix`, in key order.
    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;
}

/// Read-write access inside a transaction.
///
/// Writes become visible to later reads in the same transaction and to
/// everyone else only after commit.
pub trait WriteTxn: ReadTxn {
    /// Insert or overwrite a key.
    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Remove a key. Removing a missing key is not an error.
    fn delete(&mut self, key: &[u8]) -> Result<()>;
}

/// A transactional key-value engine.
///
/// # Design Notes
///
/// - **All-or-nothing**: if an `update` closure returns `Err`, none of its
///   writes are applied.
/// - **No retries**: engine failures (I/O, lock timeouts) are returned to
///   the caller unchanged.
/// - **Durability**: a successful `update` is committed before it returns;
///   whether that includes an fsync is engine configuration.
pub trait KvEngine: Send + Sync {
    /// Run `f` in a read-only transaction.
    fn view<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn ReadTxn) -> Result<T>;

    /// Run `f` in a read-write transaction, committing on `Ok`.
    fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn WriteTxn) -> Result<T>;
}

/// The smallest byte string greater than every key starting with `prefix`.
///
/// `None` when no such bound exists (empty prefix or all `0xff`).
pub(crate) fn prefix_upper_bound(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut bound = prefix.to_vec();
    while let Some(last) = bound.pop() {
        if last < u8::MAX {
            bound.push(last + 1);
            return Some(bound);
        }
    }
    None
}

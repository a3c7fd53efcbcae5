//! SQLite implementation of the engine traits.
//!
//! This is the primary storage backend. It uses rusqlite with bundled
//! SQLite and a single `kv` table. Writes run in `BEGIN IMMEDIATE`
//! transactions so check-then-write sequences cannot interleave with another
//! writer.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use crate::config::SqliteConfig;
use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{prefix_upper_bound, KvEngine, ReadTxn, WriteTxn};

/// SQLite-based engine.
///
/// Thread-safe via internal Mutex: one connection, one transaction at a time.
pub struct SqliteEngine {
    conn: Mutex<Connection>,
}

impl SqliteEngine {
    /// Open a SQLite database at the given path with default settings.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_config(&SqliteConfig::at(path.as_ref()))
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        Self::with_config(&SqliteConfig::default())
    }

    /// Open according to `config`.
    pub fn with_config(config: &SqliteConfig) -> Result<Self> {
        let mut conn = match &config.path {
            Some(path) => Connection::open(path)?,
            None => Connection::open_in_memory()?,
        };

        conn.busy_timeout(config.busy_timeout())?;
        if config.path.is_some() {
            let mode: String =
                conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
            tracing::debug!(journal_mode = %mode, "opened sqlite database");
        }
        let synchronous = if config.sync_writes { "FULL" } else { "NORMAL" };
        conn.pragma_update(None, "synchronous", synchronous)?;

        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl std::fmt::Debug for SqliteEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteEngine").finish_non_exhaustive()
    }
}

impl KvEngine for SqliteEngine {
    fn view<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn ReadTxn) -> Result<T>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
        let outcome = {
            let txn = SqliteTxn { conn: &tx };
            f(&txn)
        };
        // Dropping `tx` rolls back; a read transaction has nothing to commit.
        drop(tx);
        outcome
    }

    fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn WriteTxn) -> Result<T>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let outcome = {
            let mut txn = SqliteTxn { conn: &tx };
            f(&mut txn)
        };
        match outcome {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(e) => {
                drop(tx);
                Err(e)
            }
        }
    }
}

/// A transaction over the `kv` table.
struct SqliteTxn<'c> {
    conn: &'c Connection,
}

impl ReadTxn for SqliteTxn<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(StoreError::from)
    }

    fn contains(&self, key: &[u8]) -> Result<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM kv WHERE key = ?1)",
            params![key],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let row_to_pair =
            |row: &rusqlite::Row<'_>| -> rusqlite::Result<(Vec<u8>, Vec<u8>)> {
                Ok((row.get(0)?, row.get(1)?))
            };

        let pairs = match prefix_upper_bound(prefix) {
            Some(upper) => {
                let mut stmt = self.conn.prepare(
                    "SELECT key, value FROM kv WHERE key >= ?1 AND key < ?2 ORDER BY key",
                )?;
                let rows = stmt
                    .query_map(params![prefix, upper], row_to_pair)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
            None => {
                let mut stmt = self
                    .conn
                    .prepare("SELECT key, value FROM kv WHERE key >= ?1 ORDER BY key")?;
                let rows = stmt
                    .query_map(params![prefix], row_to_pair)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
        };

        Ok(pairs)
    }
}

impl WriteTxn for SqliteTxn<'_> {
    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let engine = SqliteEngine::open_memory().unwrap();
        engine.update(|txn| txn.set(b"a", b"1")).unwrap();

        let value = engine.view(|txn| txn.get(b"a")).unwrap();
        assert_eq!(value, Some(b"1".to_vec()));
        assert!(engine.view(|txn| txn.contains(b"a")).unwrap());
        assert!(!engine.view(|txn| txn.contains(b"b")).unwrap());
    }

    #[test]
    fn test_failed_update_rolls_back() {
        let engine = SqliteEngine::open_memory().unwrap();
        engine.update(|txn| txn.set(b"kept", b"1")).unwrap();

        let result: Result<()> = engine.update(|txn| {
            txn.set(b"dropped", b"2")?;
            txn.delete(b"kept")?;
            Err(StoreError::Migration("abort".into()))
        });
        assert!(result.is_err());

        assert_eq!(engine.view(|txn| txn.get(b"dropped")).unwrap(), None);
        assert_eq!(engine.view(|txn| txn.get(b"kept")).unwrap(), Some(b"1".to_vec()));
    }

    #[test]
    fn test_reads_see_own_writes() {
        let engine = SqliteEngine::open_memory().unwrap();
        let seen = engine
            .update(|txn| {
                txn.set(b"k", b"v")?;
                txn.get(b"k")
            })
            .unwrap();
        assert_eq!(seen, Some(b"v".to_vec()));
    }

    #[test]
    fn test_scan_prefix() {
        let engine = SqliteEngine::open_memory().unwrap();
        engine
            .update(|txn| {
                txn.set(b"p/b", b"2")?;
                txn.set(b"p/a", b"1")?;
                txn.set(b"q/a", b"3")?;
                txn.set(b"p", b"0")
            })
            .unwrap();

        let pairs = engine.view(|txn| txn.scan_prefix(b"p/")).unwrap();
        assert_eq!(
            pairs,
            vec![
                (b"p/a".to_vec(), b"1".to_vec()),
                (b"p/b".to_vec(), b"2".to_vec()),
            ]
        );

        let everything = engine.view(|txn| txn.scan_prefix(b"")).unwrap();
        assert_eq!(everything.len(), 4);
    }

    #[test]
    fn test_delete_missing_is_ok() {
        let engine = SqliteEngine::open_memory().unwrap();
        engine.update(|txn| txn.delete(b"nope")).unwrap();
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thrap.db");

        {
            let engine = SqliteEngine::open(&path).unwrap();
            engine.update(|txn| txn.set(b"durable", b"yes")).unwrap();
        }

        let engine = SqliteEngine::open(&path).unwrap();
        assert_eq!(
            engine.view(|txn| txn.get(b"durable")).unwrap(),
            Some(b"yes".to_vec())
        );
    }
}

//! In-memory storage backend.
//!
//! Committed rows live in an ordered map behind a reader-writer lock. Nothing
//! survives the engine being dropped, which makes this backend the default
//! for tests and for repeated harness runs.

use std::collections::BTreeMap;
use std::sync::RwLock;

use super::buffer::WriteOp;
use super::locking::{CommittedStore, LockingTransaction};
use crate::engine::{StorageEngine, StorageError};
use crate::lock::{LockConfig, LockManager};

/// Committed rows keyed by `(table, key)`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: RwLock<BTreeMap<(String, Vec<u8>), Vec<u8>>>,
}

impl MemoryStore {
    /// Number of committed rows across all tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or_default()
    }

    /// Check if no rows are committed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CommittedStore for MemoryStore {
    fn read(&self, table: &str, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let rows = self
            .rows
            .read()
            .map_err(|e| StorageError::Internal(format!("row map poisoned: {e}")))?;
        Ok(rows.get(&(table.to_owned(), key.to_vec())).cloned())
    }

    fn apply(&self, ops: Vec<WriteOp>) -> Result<(), StorageError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|e| StorageError::Internal(format!("row map poisoned: {e}")))?;
        for op in ops {
            match op {
                WriteOp::Put { table, key, value } => {
                    rows.insert((table, key), value);
                }
                WriteOp::Delete { table, key } => {
                    rows.remove(&(table, key));
                }
            }
        }
        Ok(())
    }
}

/// A transaction on a [`MemoryEngine`].
pub type MemoryTransaction<'a> = LockingTransaction<'a, MemoryStore>;

/// A storage engine that keeps committed rows in memory.
///
/// # Example
///
/// ```
/// use lockwait_storage::backends::MemoryEngine;
/// use lockwait_storage::{StorageEngine, Transaction};
///
/// let engine = MemoryEngine::new();
///
/// let mut tx = engine.begin_write().unwrap();
/// tx.put("post", b"1", b"hello").unwrap();
/// tx.commit().unwrap();
///
/// let tx = engine.begin_read().unwrap();
/// assert_eq!(tx.get("post", b"1").unwrap(), Some(b"hello".to_vec()));
/// ```
#[derive(Debug, Default)]
pub struct MemoryEngine {
    store: MemoryStore,
    locks: LockManager,
}

impl MemoryEngine {
    /// Create an engine with the default lock configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with a custom lock configuration.
    #[must_use]
    pub fn with_lock_config(config: LockConfig) -> Self {
        Self { store: MemoryStore::default(), locks: LockManager::new(config) }
    }

    /// The committed rows.
    #[must_use]
    pub const fn store(&self) -> &MemoryStore {
        &self.store
    }
}

impl StorageEngine for MemoryEngine {
    type Transaction<'a> = MemoryTransaction<'a>;

    fn begin_read(&self) -> Result<Self::Transaction<'_>, StorageError> {
        Ok(LockingTransaction::new_read(&self.store, &self.locks))
    }

    fn begin_write(&self) -> Result<Self::Transaction<'_>, StorageError> {
        Ok(LockingTransaction::new_write(&self.store, &self.locks))
    }

    fn lock_manager(&self) -> &LockManager {
        &self.locks
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::engine::Transaction;
    use crate::lock::LockKey;

    #[test]
    fn test_write_and_read() {
        let engine = MemoryEngine::new();

        let mut tx = engine.begin_write().expect("failed to begin write");
        tx.put("post", b"1", b"value").expect("failed to put");
        assert_eq!(tx.get("post", b"1").expect("failed to get"), Some(b"value".to_vec()));
        tx.commit().expect("failed to commit");

        let tx = engine.begin_read().expect("failed to begin read");
        assert!(tx.is_read_only());
        assert_eq!(tx.get("post", b"1").expect("failed to get"), Some(b"value".to_vec()));
        assert_eq!(engine.store().len(), 1);
    }

    #[test]
    fn test_uncommitted_writes_are_invisible() {
        let engine = MemoryEngine::new();

        let mut writer = engine.begin_write().expect("failed to begin write");
        writer.put("post", b"1", b"draft").expect("failed to put");

        let reader = engine.begin_read().expect("failed to begin read");
        assert_eq!(reader.get("post", b"1").expect("failed to get"), None);

        writer.rollback().expect("failed to rollback");
        assert!(engine.store().is_empty());
    }

    #[test]
    fn test_read_only_rejects_locking() {
        let engine = MemoryEngine::new();
        let mut tx = engine.begin_read().expect("failed to begin read");

        assert!(matches!(tx.put("post", b"1", b"x"), Err(StorageError::ReadOnly)));
        assert!(matches!(tx.get_for_update("post", b"1", None), Err(StorageError::ReadOnly)));
        assert!(tx.held_locks().is_empty());
    }

    #[test]
    fn test_drop_releases_locks() {
        let engine = MemoryEngine::new();
        let key = LockKey::new("post", b"1".to_vec());

        {
            let mut tx = engine.begin_write().expect("failed to begin write");
            tx.get_for_update("post", b"1", None).expect("failed to lock");
            assert_eq!(tx.held_locks(), vec![key.clone()]);
        }

        assert_eq!(engine.lock_manager().holder(&key), None);
        let mut tx = engine.begin_write().expect("failed to begin write");
        tx.get_for_update("post", b"1", Some(Duration::from_millis(10)))
            .expect("lock should be free after drop");
    }

    #[test]
    fn test_delete_reports_existence() {
        let engine = MemoryEngine::new();
        let mut tx = engine.begin_write().expect("failed to begin write");
        tx.put("post", b"1", b"v").expect("failed to put");
        tx.commit().expect("failed to commit");

        let mut tx = engine.begin_write().expect("failed to begin write");
        assert!(tx.delete("post", b"1").expect("failed to delete"));
        assert!(!tx.delete("post", b"2").expect("failed to delete"));
        tx.commit().expect("failed to commit");

        assert!(engine.store().is_empty());
    }
}

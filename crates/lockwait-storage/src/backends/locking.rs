//! The lock-taking transaction shared by all backends.

use std::time::Duration;

use tracing::debug;

use super::buffer::{WriteBuffer, WriteOp};
use crate::engine::{StorageError, Transaction};
use crate::lock::{LockKey, LockManager, TxnId};

/// Where committed rows live.
///
/// A store only needs to read the latest committed value of a key and to
/// apply a batch of writes atomically. Isolation between concurrent
/// transactions comes from row locks, not from the store.
pub trait CommittedStore: Send + Sync {
    /// Read the latest committed value of a key.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read fails.
    fn read(&self, table: &str, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError>;

    /// Apply a batch of writes atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch cannot be applied; no write is visible then.
    fn apply(&self, ops: Vec<WriteOp>) -> Result<(), StorageError>;
}

/// A transaction that locks rows through a [`LockManager`] and commits into
/// a [`CommittedStore`].
///
/// Dropping the transaction without committing discards its writes and
/// releases its locks.
pub struct LockingTransaction<'a, S: CommittedStore> {
    id: TxnId,
    store: &'a S,
    locks: &'a LockManager,
    buffer: WriteBuffer,
    read_only: bool,
    finished: bool,
}

impl<'a, S: CommittedStore> LockingTransaction<'a, S> {
    /// Start a read-only transaction.
    pub fn new_read(store: &'a S, locks: &'a LockManager) -> Self {
        Self::new(store, locks, true)
    }

    /// Start a read-write transaction.
    pub fn new_write(store: &'a S, locks: &'a LockManager) -> Self {
        Self::new(store, locks, false)
    }

    fn new(store: &'a S, locks: &'a LockManager, read_only: bool) -> Self {
        let id = locks.begin();
        debug!(txn = %id, read_only, "transaction started");
        Self { id, store, locks, buffer: WriteBuffer::new(), read_only, finished: false }
    }

    fn lock_row(
        &self,
        table: &str,
        key: &[u8],
        timeout: Option<Duration>,
    ) -> Result<(), StorageError> {
        if self.read_only {
            return Err(StorageError::ReadOnly);
        }
        self.locks.acquire(self.id, &LockKey::new(table, key), timeout)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<usize, StorageError> {
        self.finished = true;
        Ok(self.locks.release_all(self.id)?)
    }
}

impl<S: CommittedStore> Transaction for LockingTransaction<'_, S> {
    fn id(&self) -> TxnId {
        self.id
    }

    fn get(&self, table: &str, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        match self.buffer.get(table, key) {
            Some(value) => Ok(value.map(<[u8]>::to_vec)),
            None => self.store.read(table, key),
        }
    }

    fn get_for_update(
        &mut self,
        table: &str,
        key: &[u8],
        timeout: Option<Duration>,
    ) -> Result<Option<Vec<u8>>, StorageError> {
        self.lock_row(table, key, timeout)?;
        self.get(table, key)
    }

    fn put(&mut self, table: &str, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        self.lock_row(table, key, None)?;
        self.buffer.put(table, key, value);
        Ok(())
    }

    fn delete(&mut self, table: &str, key: &[u8]) -> Result<bool, StorageError> {
        self.lock_row(table, key, None)?;
        let existed = self.get(table, key)?.is_some();
        self.buffer.delete(table, key);
        Ok(existed)
    }

    fn commit(mut self) -> Result<(), StorageError> {
        let ops = std::mem::take(&mut self.buffer).into_ops();
        let writes = ops.len();
        let applied = if ops.is_empty() { Ok(()) } else { self.store.apply(ops) };
        let released = self.finish()?;
        applied?;
        debug!(txn = %self.id, writes, released, "transaction committed");
        Ok(())
    }

    fn rollback(mut self) -> Result<(), StorageError> {
        let discarded = self.buffer.len();
        let released = self.finish()?;
        debug!(txn = %self.id, discarded, released, "transaction rolled back");
        Ok(())
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn held_locks(&self) -> Vec<LockKey> {
        self.locks.held_by(self.id)
    }
}

impl<S: CommittedStore> Drop for LockingTransaction<'_, S> {
    fn drop(&mut self) {
        if !self.finished {
            self.locks.release_on_drop(self.id);
            debug!(txn = %self.id, "transaction dropped without commit, rolled back");
        }
    }
}

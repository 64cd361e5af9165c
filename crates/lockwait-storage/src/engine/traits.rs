//! Core storage engine traits.
//!
//! - [`StorageEngine`] - The main entry point for storage operations
//! - [`Transaction`] - Reads, locking reads, and buffered writes

use std::sync::Arc;
use std::time::Duration;

use super::StorageError;
use crate::lock::{LockKey, LockManager, TxnId};

/// A storage engine that provides transactional key-value operations with
/// pessimistic row locking.
///
/// Implementations must be thread-safe (`Send + Sync`). Each engine owns one
/// [`LockManager`]; every transaction it hands out locks rows through it.
///
/// # Example
///
/// ```ignore
/// use lockwait_storage::{StorageEngine, StorageError, Transaction};
///
/// fn example<E: StorageEngine>(engine: &E) -> Result<(), StorageError> {
///     let mut tx = engine.begin_write()?;
///     let current = tx.get_for_update("post", b"1", None)?;
///     tx.put("post", b"1", b"updated")?;
///     tx.commit()?;
///     Ok(())
/// }
/// ```
pub trait StorageEngine: Send + Sync {
    /// The transaction type for this engine.
    type Transaction<'a>: Transaction
    where
        Self: 'a;

    /// Begin a read-only transaction.
    ///
    /// Read transactions never take locks and reject writes.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Transaction`] if the transaction cannot be started.
    fn begin_read(&self) -> Result<Self::Transaction<'_>, StorageError>;

    /// Begin a read-write transaction.
    ///
    /// Write transactions run concurrently; conflicting access to the same
    /// row is serialized by row locks.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Transaction`] if the transaction cannot be started.
    fn begin_write(&self) -> Result<Self::Transaction<'_>, StorageError>;

    /// The lock manager shared by this engine's transactions.
    fn lock_manager(&self) -> &LockManager;

    /// Flush any buffered data to durable storage.
    ///
    /// The default implementation does nothing, as the bundled backends make
    /// data durable on commit.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the flush fails.
    fn flush(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// A transaction over a storage engine.
///
/// Writes are buffered and become visible to others only on commit. Every
/// row a write transaction touches through [`Transaction::get_for_update`],
/// [`Transaction::put`] or [`Transaction::delete`] stays exclusively locked
/// until the transaction commits, rolls back, or is dropped.
pub trait Transaction {
    /// The transaction's id, as seen by the lock manager.
    fn id(&self) -> TxnId;

    /// Read the latest committed value of a key, overlaid with this
    /// transaction's own uncommitted writes. Takes no lock.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read fails.
    fn get(&self, table: &str, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError>;

    /// Lock a row for write, then read it.
    ///
    /// Blocks while another transaction holds the row. The wait is bounded by
    /// `timeout`, or by the engine's configured lock wait when `None`.
    ///
    /// # Errors
    ///
    /// - [`StorageError::Lock`] with `DeadlockDetected` if waiting would
    ///   close a cycle and this transaction was chosen as the victim
    /// - [`StorageError::Lock`] with `LockWaitTimeout` if the wait expired
    /// - [`StorageError::ReadOnly`] in a read-only transaction
    fn get_for_update(
        &mut self,
        table: &str,
        key: &[u8],
        timeout: Option<Duration>,
    ) -> Result<Option<Vec<u8>>, StorageError>;

    /// Put a key-value pair into a table, locking the row first.
    ///
    /// # Errors
    ///
    /// Returns an error if the row lock cannot be acquired or if this is a
    /// read-only transaction.
    fn put(&mut self, table: &str, key: &[u8], value: &[u8]) -> Result<(), StorageError>;

    /// Delete a key from a table, locking the row first.
    ///
    /// Returns `Ok(true)` if the key existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the row lock cannot be acquired or if this is a
    /// read-only transaction.
    fn delete(&mut self, table: &str, key: &[u8]) -> Result<bool, StorageError>;

    /// Commit the transaction, applying buffered writes atomically and
    /// releasing all row locks.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Transaction`] if the writes cannot be applied.
    /// Locks are released either way.
    fn commit(self) -> Result<(), StorageError>;

    /// Roll back the transaction, discarding buffered writes and releasing
    /// all row locks.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock table cannot be updated.
    fn rollback(self) -> Result<(), StorageError>;

    /// Check if this is a read-only transaction.
    fn is_read_only(&self) -> bool;

    /// The rows currently locked by this transaction.
    fn held_locks(&self) -> Vec<LockKey>;
}

/// Implement `StorageEngine` for `Arc<E>` to allow shared ownership of engines.
impl<E: StorageEngine> StorageEngine for Arc<E> {
    type Transaction<'a>
        = E::Transaction<'a>
    where
        Self: 'a;

    fn begin_read(&self) -> Result<Self::Transaction<'_>, StorageError> {
        (**self).begin_read()
    }

    fn begin_write(&self) -> Result<Self::Transaction<'_>, StorageError> {
        (**self).begin_write()
    }

    fn lock_manager(&self) -> &LockManager {
        (**self).lock_manager()
    }

    fn flush(&self) -> Result<(), StorageError> {
        (**self).flush()
    }
}

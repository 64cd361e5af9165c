//! Storage error types.

use thiserror::Error;

use crate::lock::LockError;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The database could not be opened.
    #[error("failed to open database: {0}")]
    Open(String),

    /// A transaction could not be started, committed, or rolled back.
    #[error("transaction error: {0}")]
    Transaction(String),

    /// Attempted a write or a locking read in a read-only transaction.
    #[error("cannot write in read-only transaction")]
    ReadOnly,

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal backend error occurred.
    #[error("internal error: {0}")]
    Internal(String),

    /// A row lock could not be acquired.
    #[error(transparent)]
    Lock(#[from] LockError),
}

impl StorageError {
    /// Returns `true` if a lock request was refused to break a wait cycle.
    #[must_use]
    pub const fn is_deadlock(&self) -> bool {
        matches!(self, Self::Lock(LockError::DeadlockDetected { .. }))
    }

    /// Returns `true` if a lock request gave up waiting.
    #[must_use]
    pub const fn is_lock_timeout(&self) -> bool {
        matches!(self, Self::Lock(LockError::LockWaitTimeout { .. }))
    }

    /// Returns `true` for either kind of lock conflict.
    ///
    /// These are the failures a caller is expected to handle by rolling back
    /// and, if it wants, retrying.
    #[must_use]
    pub const fn is_lock_conflict(&self) -> bool {
        self.is_deadlock() || self.is_lock_timeout()
    }
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::lock::{LockKey, TxnId};

    #[test]
    fn test_lock_conflict_classification() {
        let deadlock = StorageError::from(LockError::DeadlockDetected {
            txn: TxnId::new(2),
            key: LockKey::new("post", 1u64.to_be_bytes()),
            cycle: vec![TxnId::new(2), TxnId::new(1)],
        });
        assert!(deadlock.is_deadlock());
        assert!(deadlock.is_lock_conflict());
        assert!(!deadlock.is_lock_timeout());

        let timeout = StorageError::from(LockError::LockWaitTimeout {
            txn: TxnId::new(1),
            key: LockKey::new("post", 1u64.to_be_bytes()),
            waited: Duration::from_millis(10),
        });
        assert!(timeout.is_lock_timeout());
        assert!(timeout.is_lock_conflict());

        assert!(!StorageError::ReadOnly.is_lock_conflict());
        assert!(!StorageError::Internal("boom".into()).is_lock_conflict());
    }

    #[test]
    fn test_lock_error_is_transparent() {
        let err = StorageError::from(LockError::Poisoned("held by panicked thread".into()));
        assert_eq!(err.to_string(), "lock table poisoned: held by panicked thread");
    }
}

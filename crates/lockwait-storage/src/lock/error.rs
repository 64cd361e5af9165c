//! Lock error types.

use std::time::Duration;

use thiserror::Error;

use super::{LockKey, TxnId};

/// Errors returned by lock requests.
#[derive(Debug, Clone, Error)]
pub enum LockError {
    /// Waiting for the lock would have closed a cycle of waiting
    /// transactions, and this transaction was chosen to abort.
    #[error("deadlock detected: {txn} aborted waiting for {key} (cycle: {})", format_cycle(.cycle))]
    DeadlockDetected {
        /// The aborted transaction.
        txn: TxnId,
        /// The row it was waiting for.
        key: LockKey,
        /// The cycle, starting at the transaction whose request closed it.
        cycle: Vec<TxnId>,
    },

    /// The lock was not granted before the wait deadline.
    #[error("lock wait timeout: {txn} waited {waited:?} for {key}")]
    LockWaitTimeout {
        /// The transaction that gave up.
        txn: TxnId,
        /// The row it was waiting for.
        key: LockKey,
        /// How long it waited.
        waited: Duration,
    },

    /// The lock table mutex was poisoned by a panicking thread.
    #[error("lock table poisoned: {0}")]
    Poisoned(String),
}

impl LockError {
    /// The transaction the error was reported to, if any.
    #[must_use]
    pub const fn txn(&self) -> Option<TxnId> {
        match self {
            Self::DeadlockDetected { txn, .. } | Self::LockWaitTimeout { txn, .. } => Some(*txn),
            Self::Poisoned(_) => None,
        }
    }
}

fn format_cycle(cycle: &[TxnId]) -> String {
    let mut out = String::new();
    for txn in cycle {
        out.push_str(&txn.to_string());
        out.push_str(" -> ");
    }
    if let Some(first) = cycle.first() {
        out.push_str(&first.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadlock_display() {
        let err = LockError::DeadlockDetected {
            txn: TxnId::new(2),
            key: LockKey::new("post", 1u64.to_be_bytes()),
            cycle: vec![TxnId::new(2), TxnId::new(1)],
        };
        assert_eq!(
            err.to_string(),
            "deadlock detected: tx2 aborted waiting for post/1 (cycle: tx2 -> tx1 -> tx2)"
        );
        assert_eq!(err.txn(), Some(TxnId::new(2)));
    }

    #[test]
    fn test_timeout_display() {
        let err = LockError::LockWaitTimeout {
            txn: TxnId::new(1),
            key: LockKey::new("post_comment", 1u64.to_be_bytes()),
            waited: Duration::from_millis(50),
        };
        assert_eq!(err.to_string(), "lock wait timeout: tx1 waited 50ms for post_comment/1");
    }
}

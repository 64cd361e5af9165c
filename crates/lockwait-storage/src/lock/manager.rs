//! The row lock manager.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{DeadlockDetection, LockConfig, LockError, LockKey, TxnId, WaitForGraph};

/// How a successful lock request was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockGrant {
    /// The row was free (or freed while waiting) and is now held.
    Granted,
    /// The requester already held the row.
    AlreadyHeld,
}

/// Counters describing lock manager activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockStats {
    /// Lock requests granted (excluding re-entrant requests).
    pub granted: u64,
    /// Lock requests that had to wait at least once.
    pub waits: u64,
    /// Requests aborted to break a deadlock.
    pub deadlocks: u64,
    /// Requests that gave up at their deadline.
    pub timeouts: u64,
}

#[derive(Default)]
struct Counters {
    granted: AtomicU64,
    waits: AtomicU64,
    deadlocks: AtomicU64,
    timeouts: AtomicU64,
}

/// Lock table state, protected by the manager's mutex.
#[derive(Default)]
struct LockTable {
    /// Current exclusive owner of each locked row.
    owners: HashMap<LockKey, TxnId>,
    /// Rows held by each transaction, in acquisition order.
    held: HashMap<TxnId, Vec<LockKey>>,
    /// Who waits on whom.
    graph: WaitForGraph,
    /// Waiting transactions picked as deadlock victims by another
    /// transaction's request, with the cycle that condemned them.
    victims: HashMap<TxnId, Vec<TxnId>>,
}

impl LockTable {
    fn grant(&mut self, txn: TxnId, key: &LockKey) {
        self.owners.insert(key.clone(), txn);
        self.held.entry(txn).or_default().push(key.clone());
        self.graph.remove_waiter(txn);
    }
}

/// Grants exclusive row locks to transactions and breaks wait cycles.
///
/// Lock requests block on a condition variable until the row is released,
/// the request is chosen as a deadlock victim, or its deadline expires.
/// Locks are held until [`LockManager::release_all`] is called for the
/// owning transaction.
///
/// # Thread Safety
///
/// `LockManager` is `Send + Sync`; engines share one manager between all of
/// their transactions.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use lockwait_storage::{LockConfig, LockKey, LockManager};
///
/// let locks = LockManager::new(LockConfig::default());
/// let alice = locks.begin();
/// let bob = locks.begin();
/// let post = LockKey::new("post", 1u64.to_be_bytes());
///
/// locks.acquire(alice, &post, None).unwrap();
/// let err = locks.acquire(bob, &post, Some(Duration::from_millis(10))).unwrap_err();
/// assert!(err.to_string().starts_with("lock wait timeout"));
///
/// locks.release_all(alice).unwrap();
/// locks.acquire(bob, &post, None).unwrap();
/// ```
pub struct LockManager {
    config: LockConfig,
    state: Mutex<LockTable>,
    released: Condvar,
    next_txn: AtomicU64,
    counters: Counters,
}

impl LockManager {
    /// Create a lock manager with the given configuration.
    #[must_use]
    pub fn new(config: LockConfig) -> Self {
        Self {
            config,
            state: Mutex::new(LockTable::default()),
            released: Condvar::new(),
            next_txn: AtomicU64::new(1),
            counters: Counters::default(),
        }
    }

    /// The configuration this manager was created with.
    #[must_use]
    pub const fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Allocate a fresh transaction id.
    pub fn begin(&self) -> TxnId {
        TxnId::new(self.next_txn.fetch_add(1, Ordering::Relaxed))
    }

    fn table(&self) -> Result<MutexGuard<'_, LockTable>, LockError> {
        self.state.lock().map_err(|e| LockError::Poisoned(e.to_string()))
    }

    /// Acquire an exclusive lock on `key` for `txn`, blocking while another
    /// transaction holds it.
    ///
    /// `timeout` bounds the wait; `None` uses the configured default.
    ///
    /// # Errors
    ///
    /// - [`LockError::DeadlockDetected`] if this request is the victim of a
    ///   wait cycle
    /// - [`LockError::LockWaitTimeout`] if the lock was not granted in time
    /// - [`LockError::Poisoned`] if the lock table is unusable
    pub fn acquire(
        &self,
        txn: TxnId,
        key: &LockKey,
        timeout: Option<Duration>,
    ) -> Result<LockGrant, LockError> {
        let started = Instant::now();
        let limit = timeout.unwrap_or(self.config.wait_timeout);
        let deadline = started.checked_add(limit);
        let mut table = self.table()?;
        let mut waiting = false;

        loop {
            if let Some(cycle) = table.victims.remove(&txn) {
                table.graph.remove_waiter(txn);
                self.counters.deadlocks.fetch_add(1, Ordering::Relaxed);
                warn!(%txn, %key, "aborting lock request: chosen as deadlock victim");
                return Err(LockError::DeadlockDetected { txn, key: key.clone(), cycle });
            }

            let owner = table.owners.get(key).copied();
            let holder = match owner {
                None => {
                    table.grant(txn, key);
                    self.counters.granted.fetch_add(1, Ordering::Relaxed);
                    debug!(%txn, %key, waited = ?started.elapsed(), "lock granted");
                    return Ok(LockGrant::Granted);
                }
                Some(owner) if owner == txn => return Ok(LockGrant::AlreadyHeld),
                Some(owner) => owner,
            };

            if !waiting {
                waiting = true;
                self.counters.waits.fetch_add(1, Ordering::Relaxed);
                debug!(%txn, %key, %holder, "waiting for lock");
            }
            table.graph.add_wait(txn, holder);

            if self.config.detection == DeadlockDetection::WaitForGraph {
                if let Some(cycle) = table.graph.find_cycle(txn) {
                    let victim = self.config.victim.choose(txn, &cycle);
                    if victim == txn {
                        table.graph.remove_waiter(txn);
                        self.counters.deadlocks.fetch_add(1, Ordering::Relaxed);
                        warn!(%txn, %key, ?cycle, "deadlock detected, aborting requester");
                        return Err(LockError::DeadlockDetected { txn, key: key.clone(), cycle });
                    }
                    if !table.victims.contains_key(&victim) {
                        warn!(%txn, %key, %victim, ?cycle, "deadlock detected, aborting victim");
                        table.victims.insert(victim, cycle);
                        self.released.notify_all();
                    }
                }
            }

            let now = Instant::now();
            let remaining = match deadline {
                Some(deadline) if now >= deadline => {
                    table.graph.remove_waiter(txn);
                    self.counters.timeouts.fetch_add(1, Ordering::Relaxed);
                    let waited = now - started;
                    warn!(%txn, %key, %holder, ?waited, "lock wait timed out");
                    return Err(LockError::LockWaitTimeout { txn, key: key.clone(), waited });
                }
                Some(deadline) => deadline - now,
                None => limit,
            };

            table = self
                .released
                .wait_timeout(table, remaining)
                .map_err(|e| LockError::Poisoned(e.to_string()))?
                .0;
        }
    }

    /// Release every lock held by `txn` and wake waiting transactions.
    ///
    /// Also forgets `txn`'s own wait edge, any pending victim mark, and the
    /// edges of transactions that were waiting on it. Returns the number of
    /// rows released. Calling it for a transaction that holds nothing is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Poisoned`] if the lock table is unusable.
    pub fn release_all(&self, txn: TxnId) -> Result<usize, LockError> {
        let mut table = self.table()?;
        Ok(self.release_locked(&mut table, txn))
    }

    /// Release for a transaction being dropped. Recovers a poisoned table
    /// rather than leaking the locks.
    pub(crate) fn release_on_drop(&self, txn: TxnId) {
        let mut table = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.release_locked(&mut table, txn);
    }

    fn release_locked(&self, table: &mut LockTable, txn: TxnId) -> usize {
        let keys = table.held.remove(&txn).unwrap_or_default();
        for key in &keys {
            if table.owners.get(key) == Some(&txn) {
                table.owners.remove(key);
            }
        }
        table.graph.remove_waiter(txn);
        table.graph.remove_holder(txn);
        table.victims.remove(&txn);

        if !keys.is_empty() {
            debug!(%txn, released = keys.len(), "locks released");
            self.released.notify_all();
        }
        keys.len()
    }

    /// The transaction currently holding `key`, if any.
    #[must_use]
    pub fn holder(&self, key: &LockKey) -> Option<TxnId> {
        self.table().ok().and_then(|table| table.owners.get(key).copied())
    }

    /// The rows held by `txn`, in acquisition order.
    #[must_use]
    pub fn held_by(&self, txn: TxnId) -> Vec<LockKey> {
        self.table().ok().and_then(|table| table.held.get(&txn).cloned()).unwrap_or_default()
    }

    /// The transactions currently blocked in [`LockManager::acquire`].
    #[must_use]
    pub fn waiting(&self) -> HashSet<TxnId> {
        self.table().map(|table| table.graph.waiters().collect()).unwrap_or_default()
    }

    /// A snapshot of the activity counters.
    #[must_use]
    pub fn stats(&self) -> LockStats {
        LockStats {
            granted: self.counters.granted.load(Ordering::Relaxed),
            waits: self.counters.waits.load(Ordering::Relaxed),
            deadlocks: self.counters.deadlocks.load(Ordering::Relaxed),
            timeouts: self.counters.timeouts.load(Ordering::Relaxed),
        }
    }
}

impl Default for LockManager {
    fn default() -> Self {
        Self::new(LockConfig::default())
    }
}

impl std::fmt::Debug for LockManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockManager")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

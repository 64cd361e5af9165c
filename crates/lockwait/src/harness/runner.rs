//! Runs the two actors against a seeded database and checks the result.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use lockwait_core::{Post, PostComment, Record};
use lockwait_storage::{LockStats, StorageEngine, Transaction};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::events::{Actor, Event, EventKind, EventLog, Target};
use super::gate::Gate;
use crate::database::Database;
use crate::error::Error;
use crate::fixtures::{self, SEED_COMMENT_ID, SEED_POST_ID};
use crate::session::Session;

/// Timeouts for one harness run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Longest each lock request may wait.
    /// Default: 2 seconds.
    pub lock_timeout: Duration,

    /// Longest an actor waits for the other at a gate.
    /// Default: 5 seconds.
    pub gate_timeout: Duration,

    /// Longest the whole run may take before it is declared hung.
    /// Default: 10 seconds.
    pub run_timeout: Duration,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(2),
            gate_timeout: Duration::from_secs(5),
            run_timeout: Duration::from_secs(10),
        }
    }
}

impl HarnessConfig {
    /// Create a configuration with default timeouts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-request lock timeout.
    #[must_use]
    pub const fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Set the gate timeout.
    #[must_use]
    pub const fn gate_timeout(mut self, timeout: Duration) -> Self {
        self.gate_timeout = timeout;
        self
    }

    /// Set the overall run timeout.
    #[must_use]
    pub const fn run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout = timeout;
        self
    }
}

/// How an actor's transaction ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum ActorOutcome {
    /// The transaction committed.
    Committed,
    /// The transaction was aborted to break a deadlock.
    Deadlocked(String),
    /// A lock request gave up waiting.
    TimedOut(String),
}

impl ActorOutcome {
    /// Returns `true` if the transaction failed with a lock conflict.
    #[must_use]
    pub const fn is_lock_failure(&self) -> bool {
        matches!(self, Self::Deadlocked(_) | Self::TimedOut(_))
    }
}

/// The result of one successful harness run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Alice's outcome.
    pub alice: ActorOutcome,
    /// Bob's outcome.
    pub bob: ActorOutcome,
    /// Every recorded step, in order.
    pub events: Vec<Event>,
    /// Wall-clock time of the concurrent phase.
    pub elapsed: Duration,
    /// Lock manager activity during the run.
    pub locks: LockStats,
}

impl RunReport {
    /// The actors whose transactions were aborted by a lock conflict.
    #[must_use]
    pub fn victims(&self) -> Vec<Actor> {
        [(Actor::Alice, &self.alice), (Actor::Bob, &self.bob)]
            .into_iter()
            .filter(|(_, outcome)| outcome.is_lock_failure())
            .map(|(actor, _)| actor)
            .collect()
    }

    /// The outcome of `actor`.
    #[must_use]
    pub const fn outcome(&self, actor: Actor) -> &ActorOutcome {
        match actor {
            Actor::Alice => &self.alice,
            Actor::Bob => &self.bob,
        }
    }
}

/// Ways a harness run can fail.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Setup or the post-run seed check failed.
    #[error("database error: {0}")]
    Database(#[from] Error),

    /// An actor thread could not be started.
    #[error("failed to spawn actor thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// An actor failed with something other than a lock conflict.
    #[error("{actor} failed with an unexpected error: {source}")]
    Unexpected {
        /// The failing actor.
        actor: Actor,
        /// The error it failed with.
        source: Error,
    },

    /// An actor waited at a gate that never opened.
    #[error("{actor} waited {waited:?} at the gate without it opening")]
    GateTimeout {
        /// The waiting actor.
        actor: Actor,
        /// How long it waited.
        waited: Duration,
    },

    /// The recorded events do not show Bob's child lock before Alice's
    /// child lock request.
    #[error("actor ordering violated: {0}")]
    OrderingViolated(String),

    /// Both transactions committed, so no lock conflict was observed.
    #[error("no lock conflict observed: both transactions committed")]
    NoContention,

    /// The run did not finish in time.
    #[error("run did not finish within {0:?}")]
    Timeout(Duration),

    /// An actor thread exited without reporting an outcome.
    #[error("{0} exited without reporting an outcome")]
    ActorLost(Actor),
}

/// Why an actor's transaction stopped early.
enum ActorError {
    Gate(Duration),
    Db(Error),
}

impl From<Error> for ActorError {
    fn from(err: Error) -> Self {
        Self::Db(err)
    }
}

type ActorResult = Result<(), ActorError>;

/// State shared by the two actor threads of one run.
struct Scenario<E: StorageEngine> {
    db: Database<E>,
    config: HarnessConfig,
    log: EventLog,
    /// Opened by Alice once she holds the post, so Bob starts second.
    post_locked: Gate,
    /// Opened by Bob once he holds the comment.
    comment_locked: Gate,
}

impl<E: StorageEngine> Scenario<E> {
    fn alice(&self) -> ActorResult {
        let actor = Actor::Alice;
        self.log.record(actor, EventKind::TxBegin);

        let result = self.db.with_transaction(|session| {
            info!("Alice locks the Post entity");
            self.lock::<Post, _>(session, actor, Target::Post, SEED_POST_ID)?;
            self.post_locked.open();

            if !self.comment_locked.wait_timeout(self.config.gate_timeout) {
                return Err(ActorError::Gate(self.config.gate_timeout));
            }
            self.log.record(actor, EventKind::GateAwaited);

            info!("Alice wants to lock the PostComment entity");
            self.lock::<PostComment, _>(session, actor, Target::Comment, SEED_COMMENT_ID)?;
            Ok(())
        });
        self.finish(actor, result)
    }

    fn bob(&self) -> ActorResult {
        let actor = Actor::Bob;
        if !self.post_locked.wait_timeout(self.config.gate_timeout) {
            return Err(ActorError::Gate(self.config.gate_timeout));
        }
        self.log.record(actor, EventKind::TxBegin);

        let result = self.db.with_transaction(|session| {
            info!("Bob locks the PostComment entity");
            self.lock::<PostComment, _>(session, actor, Target::Comment, SEED_COMMENT_ID)?;

            self.log.record(actor, EventKind::GateOpened);
            self.comment_locked.open();

            info!("Bob wants to lock the Post entity");
            self.lock::<Post, _>(session, actor, Target::Post, SEED_POST_ID)?;
            Ok(())
        });
        self.finish(actor, result)
    }

    fn lock<R: Record, T: Transaction>(
        &self,
        session: &mut Session<T>,
        actor: Actor,
        target: Target,
        id: R::Id,
    ) -> Result<R, ActorError> {
        self.log.record(actor, EventKind::LockRequested(target));
        let record = session
            .find_for_update::<R>(id, Some(self.config.lock_timeout))?
            .ok_or_else(|| Error::not_found(R::COLLECTION, id))?;
        self.log.record(actor, EventKind::LockAcquired(target));
        Ok(record)
    }

    fn finish(&self, actor: Actor, result: ActorResult) -> ActorResult {
        match &result {
            Ok(()) => {
                self.log.record(actor, EventKind::Committed);
                debug!(%actor, "transaction committed");
            }
            Err(ActorError::Db(e)) if e.is_lock_conflict() => {
                info!(%actor, error = %e, "Deadlock detected");
                self.log.record(actor, EventKind::Aborted(e.to_string()));
            }
            Err(_) => {}
        }
        result
    }
}

/// Drives Alice and Bob through the opposite-order locking scenario.
///
/// The database must already hold the seed rows (see [`fixtures::seed`]).
/// Every run spawns one thread per actor, waits for both outcomes up to the
/// run timeout, and then validates the run:
///
/// 1. an actor error other than a lock conflict is
///    [`HarnessError::Unexpected`]; a gate that never opened is
///    [`HarnessError::GateTimeout`]
/// 2. Bob must have locked the comment before Alice requested it, else
///    [`HarnessError::OrderingViolated`]
/// 3. at least one actor must have failed with a lock conflict, else
///    [`HarnessError::NoContention`]
///
/// Finally the seed rows are re-read and must be unchanged.
///
/// # Example
///
/// ```
/// use lockwait::harness::{DeadlockHarness, HarnessConfig};
/// use lockwait::{fixtures, Database};
///
/// let db = Database::in_memory();
/// fixtures::seed(&db)?;
///
/// let report = DeadlockHarness::new(db, HarnessConfig::default()).run()?;
/// assert!(!report.victims().is_empty());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct DeadlockHarness<E: StorageEngine + 'static> {
    db: Database<E>,
    config: HarnessConfig,
}

impl<E: StorageEngine + 'static> DeadlockHarness<E> {
    /// Create a harness over a seeded database.
    pub const fn new(db: Database<E>, config: HarnessConfig) -> Self {
        Self { db, config }
    }

    /// The harness configuration.
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// The database the actors run against.
    pub const fn database(&self) -> &Database<E> {
        &self.db
    }

    /// Run the scenario once.
    ///
    /// # Errors
    ///
    /// Returns a [`HarnessError`] if the run hung, an actor failed
    /// unexpectedly, the ordering check failed, no lock conflict occurred,
    /// or the seed rows changed.
    pub fn run(&self) -> Result<RunReport, HarnessError> {
        let started = Instant::now();
        let before = self.db.lock_stats();

        let scenario = Arc::new(Scenario {
            db: self.db.clone(),
            config: self.config,
            log: EventLog::new(),
            post_locked: Gate::new(),
            comment_locked: Gate::new(),
        });

        let (tx, rx) = mpsc::channel();
        let mut handles = Vec::with_capacity(2);
        for actor in [Actor::Alice, Actor::Bob] {
            let scenario = Arc::clone(&scenario);
            let tx = tx.clone();
            let handle =
                thread::Builder::new().name(actor.to_string().to_lowercase()).spawn(move || {
                    let result = match actor {
                        Actor::Alice => scenario.alice(),
                        Actor::Bob => scenario.bob(),
                    };
                    // The receiver is gone if the run already timed out.
                    let _ = tx.send((actor, result));
                })?;
            handles.push(handle);
        }
        drop(tx);

        let deadline = started + self.config.run_timeout;
        let mut alice = None;
        let mut bob = None;
        while alice.is_none() || bob.is_none() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok((Actor::Alice, result)) => alice = Some(result),
                Ok((Actor::Bob, result)) => bob = Some(result),
                Err(RecvTimeoutError::Timeout) => {
                    warn!(timeout = ?self.config.run_timeout, "harness run timed out");
                    return Err(HarnessError::Timeout(self.config.run_timeout));
                }
                Err(RecvTimeoutError::Disconnected) => {
                    let lost = if alice.is_none() { Actor::Alice } else { Actor::Bob };
                    return Err(HarnessError::ActorLost(lost));
                }
            }
        }
        let elapsed = started.elapsed();

        // Both actors have reported; joining drops their database handles.
        for handle in handles {
            if handle.join().is_err() {
                warn!("actor thread panicked after reporting");
            }
        }

        let (alice, bob) = match (settle(Actor::Alice, alice), settle(Actor::Bob, bob)) {
            (Ok(alice), Ok(bob)) => (alice, bob),
            (Err(e @ HarnessError::Unexpected { .. }), _)
            | (_, Err(e @ HarnessError::Unexpected { .. })) => return Err(e),
            (Err(e), _) | (_, Err(e)) => return Err(e),
        };

        check_ordering(&scenario.log)?;
        if !alice.is_lock_failure() && !bob.is_lock_failure() {
            return Err(HarnessError::NoContention);
        }

        fixtures::verify_seed(&self.db)?;

        let report = RunReport {
            alice,
            bob,
            events: scenario.log.snapshot(),
            elapsed,
            locks: stats_since(before, self.db.lock_stats()),
        };
        info!(victims = ?report.victims(), ?elapsed, "harness run complete");
        Ok(report)
    }

    /// Run the scenario `runs` times, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first failing run's [`HarnessError`].
    pub fn run_many(&self, runs: usize) -> Result<Vec<RunReport>, HarnessError> {
        (1..=runs)
            .map(|run| {
                debug!(run, runs, "starting harness run");
                self.run()
            })
            .collect()
    }
}

fn settle(actor: Actor, result: Option<ActorResult>) -> Result<ActorOutcome, HarnessError> {
    match result {
        Some(Ok(())) => Ok(ActorOutcome::Committed),
        Some(Err(ActorError::Db(e))) if e.is_deadlock() => Ok(ActorOutcome::Deadlocked(e.to_string())),
        Some(Err(ActorError::Db(e))) if e.is_lock_timeout() => Ok(ActorOutcome::TimedOut(e.to_string())),
        Some(Err(ActorError::Db(source))) => Err(HarnessError::Unexpected { actor, source }),
        Some(Err(ActorError::Gate(waited))) => Err(HarnessError::GateTimeout { actor, waited }),
        None => Err(HarnessError::ActorLost(actor)),
    }
}

fn check_ordering(log: &EventLog) -> Result<(), HarnessError> {
    let bob_locked = log.position(Actor::Bob, &EventKind::LockAcquired(Target::Comment));
    let alice_requested = log.position(Actor::Alice, &EventKind::LockRequested(Target::Comment));
    match (bob_locked, alice_requested) {
        (Some(locked), Some(requested)) if locked < requested => Ok(()),
        (locked, requested) => Err(HarnessError::OrderingViolated(format!(
            "Bob's comment lock (event {locked:?}) must precede Alice's comment request (event {requested:?})"
        ))),
    }
}

fn stats_since(before: LockStats, after: LockStats) -> LockStats {
    LockStats {
        granted: after.granted.saturating_sub(before.granted),
        waits: after.waits.saturating_sub(before.waits),
        deadlocks: after.deadlocks.saturating_sub(before.deadlocks),
        timeouts: after.timeouts.saturating_sub(before.timeouts),
    }
}

//! The ordered record of what each actor did.
//!
//! The harness does not trust the gate alone to order the actors: every
//! step is appended to an [`EventLog`] and the resulting sequence is checked
//! after the run.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

/// One of the two concurrent transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Actor {
    /// Locks the parent first, then the child.
    Alice,
    /// Locks the child first, then the parent.
    Bob,
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alice => f.write_str("Alice"),
            Self::Bob => f.write_str("Bob"),
        }
    }
}

/// The row an actor locks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    /// The parent `post` row.
    Post,
    /// The child `post_comment` row.
    Comment,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Post => f.write_str("Post"),
            Self::Comment => f.write_str("PostComment"),
        }
    }
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum EventKind {
    /// The actor's transaction began.
    TxBegin,
    /// The actor asked for a row lock.
    LockRequested(Target),
    /// The row lock was granted.
    LockAcquired(Target),
    /// Bob opened the gate.
    GateOpened,
    /// Alice passed the gate.
    GateAwaited,
    /// The transaction was aborted by a lock conflict.
    Aborted(String),
    /// The transaction committed.
    Committed,
}

/// A recorded step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Position in the log, starting at 0.
    pub seq: u64,
    /// Who did it.
    pub actor: Actor,
    /// What happened.
    pub kind: EventKind,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} ", self.seq, self.actor)?;
        match &self.kind {
            EventKind::TxBegin => f.write_str("begins"),
            EventKind::LockRequested(target) => write!(f, "requests {target}"),
            EventKind::LockAcquired(target) => write!(f, "locks {target}"),
            EventKind::GateOpened => f.write_str("opens the gate"),
            EventKind::GateAwaited => f.write_str("passes the gate"),
            EventKind::Aborted(reason) => write!(f, "aborts: {reason}"),
            EventKind::Committed => f.write_str("commits"),
        }
    }
}

/// A thread-safe, append-only event sequence.
///
/// Sequence numbers are assigned under the log's mutex, so they agree with
/// the order in which `record` calls completed.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<Event>>,
}

impl EventLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and return its sequence number.
    pub fn record(&self, actor: Actor, kind: EventKind) -> u64 {
        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        let seq = events.len() as u64;
        events.push(Event { seq, actor, kind });
        seq
    }

    /// A copy of every event recorded so far, in order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Event> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// The sequence number of the first event by `actor` matching `kind`.
    #[must_use]
    pub fn position(&self, actor: Actor, kind: &EventKind) -> Option<u64> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|e| e.actor == actor && &e.kind == kind)
            .map(|e| e.seq)
    }
}

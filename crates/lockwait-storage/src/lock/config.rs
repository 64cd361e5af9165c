//! Lock manager configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::TxnId;

/// How the lock manager notices that waiting transactions form a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeadlockDetection {
    /// Search the wait-for graph every time a transaction starts waiting.
    #[default]
    WaitForGraph,

    /// Never search; rely on lock wait deadlines to break cycles.
    TimeoutOnly,
}

/// Which transaction in a detected cycle is aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VictimPolicy {
    /// Abort the transaction whose lock request closed the cycle.
    #[default]
    Requester,

    /// Abort the most recently started transaction in the cycle.
    Youngest,
}

impl VictimPolicy {
    /// Pick the victim among the members of `cycle`.
    ///
    /// `cycle` always contains `requester`.
    #[must_use]
    pub fn choose(self, requester: TxnId, cycle: &[TxnId]) -> TxnId {
        match self {
            Self::Requester => requester,
            Self::Youngest => cycle.iter().copied().max().unwrap_or(requester),
        }
    }
}

/// Configuration for the lock manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockConfig {
    /// Cycle detection mode.
    /// Default: wait-for graph.
    pub detection: DeadlockDetection,

    /// Victim selection for detected cycles.
    /// Default: the requester.
    pub victim: VictimPolicy,

    /// Longest a lock request waits when the caller gives no timeout.
    /// Default: 5 seconds.
    pub wait_timeout: Duration,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            detection: DeadlockDetection::WaitForGraph,
            victim: VictimPolicy::Requester,
            wait_timeout: Duration::from_secs(5),
        }
    }
}

impl LockConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the detection mode.
    #[must_use]
    pub const fn detection(mut self, detection: DeadlockDetection) -> Self {
        self.detection = detection;
        self
    }

    /// Set the victim policy.
    #[must_use]
    pub const fn victim(mut self, victim: VictimPolicy) -> Self {
        self.victim = victim;
        self
    }

    /// Set the default lock wait timeout.
    #[must_use]
    pub const fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Create a configuration that only breaks cycles by timing out.
    #[must_use]
    pub fn timeout_only(wait_timeout: Duration) -> Self {
        Self { detection: DeadlockDetection::TimeoutOnly, wait_timeout, ..Self::default() }
    }
}

//! Pessimistic row locking with deadlock detection.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                          LockManager                                 │
//! │  - One exclusive owner per row (table, key)                          │
//! │  - Waiters sleep on a condition variable until a release             │
//! │  - Every wait is bounded by a deadline                               │
//! └─────────────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         WaitForGraph                                 │
//! │  - One edge per waiting transaction: waiter → holder                 │
//! │  - A new edge that closes a cycle picks a victim                     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Detection Modes
//!
//! - [`DeadlockDetection::WaitForGraph`]: cycles are found the moment the
//!   closing edge is added, and the [`VictimPolicy`] decides who aborts.
//! - [`DeadlockDetection::TimeoutOnly`]: no graph search; a cycle resolves
//!   when the first participant's wait deadline expires.

mod config;
mod error;
mod key;
mod manager;
mod wait_graph;

pub use config::{DeadlockDetection, LockConfig, VictimPolicy};
pub use error::LockError;
pub use key::{LockKey, TxnId};
pub use manager::{LockGrant, LockManager, LockStats};
pub use wait_graph::WaitForGraph;

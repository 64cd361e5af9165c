//! `lockwait` Storage
//!
//! This crate provides the transactional storage layer the deadlock harness
//! runs against: engine traits, a pessimistic row-lock manager with deadlock
//! detection, and two backends.
//!
//! # Overview
//!
//! Every write transaction takes exclusive row locks through the engine's
//! [`LockManager`]. When a lock request closes a wait cycle, one transaction
//! in the cycle fails with [`LockError::DeadlockDetected`]; a request that
//! waits past its deadline fails with [`LockError::LockWaitTimeout`]. Either failure leaves
//! the transaction usable only for rollback.
//!
//! # Core Traits
//!
//! - [`StorageEngine`] - The main entry point for storage operations
//! - [`Transaction`] - Key-value operations plus `get_for_update` row locking
//!
//! # Error Handling
//!
//! All storage operations return [`StorageResult<T>`], which is an alias for
//! `Result<T, StorageError>`. Lock failures are wrapped in
//! [`StorageError::Lock`]; use [`StorageError::is_lock_conflict`] to tell them
//! apart from real storage faults.
//!
//! # Example
//!
//! ```ignore
//! use lockwait_storage::{StorageEngine, Transaction};
//! use lockwait_storage::backends::MemoryEngine;
//!
//! let engine = MemoryEngine::new();
//!
//! let mut tx = engine.begin_write()?;
//! tx.put("post", b"1", b"hello")?;
//! tx.commit()?;
//!
//! let mut tx = engine.begin_write()?;
//! let row = tx.get_for_update("post", b"1", None)?; // row is now locked
//! tx.rollback()?; // lock released
//! ```
//!
//! # Modules
//!
//! - [`engine`] - Storage engine traits and errors
//! - [`lock`] - Row lock manager, wait-for graph, and lock configuration
//! - [`backends`] - In-memory and redb-backed engines

#![deny(clippy::unwrap_used)]

pub mod backends;
pub mod engine;
pub mod lock;

pub use engine::{StorageEngine, StorageError, StorageResult, Transaction};
pub use lock::{
    DeadlockDetection, LockConfig, LockError, LockGrant, LockKey, LockManager, LockStats, TxnId,
    VictimPolicy, WaitForGraph,
};

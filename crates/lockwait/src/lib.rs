//! `lockwait` - provoke and observe transaction deadlocks
//!
//! Two concurrent transactions lock the same pair of rows in opposite order.
//! The storage layer has to notice the wait cycle and abort one of them, and
//! the harness checks that it did, that the actors really ran in the forced
//! order, and that the data is untouched afterwards.
//!
//! # Quick Start
//!
//! ```
//! use lockwait::harness::{DeadlockHarness, HarnessConfig};
//! use lockwait::{fixtures, Database};
//!
//! let db = Database::in_memory();
//! fixtures::seed(&db)?;
//!
//! let harness = DeadlockHarness::new(db.clone(), HarnessConfig::default());
//! for report in harness.run_many(3)? {
//!     println!("victims: {:?}", report.victims());
//! }
//!
//! fixtures::verify_seed(&db)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Backends
//!
//! [`Database`] is generic over the storage engine. The in-memory engine is
//! the default; Redb databases are opened with [`Database::open_redb`] or
//! [`Database::redb_in_memory`]. Both take row locks through the same lock
//! manager, configured by [`LockConfig`].
//!
//! # Modules
//!
//! - [`config`] - Backend selection and lock settings
//! - [`database`] - The database handle
//! - [`session`] - Typed record access inside a transaction
//! - [`fixtures`] - The seeded post and comment
//! - [`harness`] - The deadlock harness
//! - [`error`] - Error types

#![deny(clippy::unwrap_used)]

pub use lockwait_core::{CommentId, Post, PostComment, PostId, Record};
pub use lockwait_storage::{
    DeadlockDetection, LockConfig, LockStats, StorageEngine, Transaction, VictimPolicy,
};

pub mod config;
pub mod database;
pub mod error;
pub mod fixtures;
pub mod harness;
pub mod session;

pub use config::{Backend, Config};
pub use database::Database;
pub use error::{Error, Result};
pub use harness::{ActorOutcome, DeadlockHarness, HarnessConfig, HarnessError, RunReport};
pub use session::Session;

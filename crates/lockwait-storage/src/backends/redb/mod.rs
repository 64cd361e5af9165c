//! Redb storage backend.
//!
//! Committed rows are stored in a Redb database, either on disk or in Redb's
//! in-memory backend. Redb allows one write transaction at a time, so
//! `lockwait` transactions do not hold a Redb write transaction open:
//! they read through short read transactions, take row locks from the
//! engine's lock manager, and apply their buffered writes in a single Redb
//! write transaction on commit.
//!
//! # Example
//!
//! ```ignore
//! use lockwait_storage::backends::RedbEngine;
//! use lockwait_storage::{StorageEngine, Transaction};
//!
//! let engine = RedbEngine::open("lockwait.redb")?;
//!
//! let mut tx = engine.begin_write()?;
//! tx.put("post", b"1", b"hello")?;
//! tx.commit()?;
//! ```

mod engine;
pub mod tables;

pub use engine::{RedbConfig, RedbEngine, RedbStore, RedbTransaction};

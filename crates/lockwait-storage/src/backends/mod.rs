//! Storage backend implementations.
//!
//! Both backends share one transaction implementation,
//! [`LockingTransaction`], which buffers writes, takes row locks through the
//! engine's [`LockManager`](crate::lock::LockManager), and hands the buffer
//! to a [`CommittedStore`] on commit. The backends differ only in where
//! committed rows live.
//!
//! # Available Backends
//!
//! - [`memory`] - Committed rows in an in-process ordered map
//! - [`redb`] - Committed rows in a Redb database file (or Redb's in-memory backend)

mod buffer;
mod locking;
pub mod memory;
pub mod redb;

pub use self::buffer::{WriteBuffer, WriteOp};
pub use self::locking::{CommittedStore, LockingTransaction};
pub use self::memory::{MemoryEngine, MemoryStore, MemoryTransaction};
pub use self::redb::{RedbConfig, RedbEngine, RedbStore, RedbTransaction};

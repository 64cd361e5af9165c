//! Storage engine traits and abstractions.
//!
//! - [`StorageEngine`] - Main entry point for creating transactions
//! - [`Transaction`] - Reads, locking reads, buffered writes, commit/rollback
//!
//! # Error Handling
//!
//! All operations return [`StorageResult<T>`] which is an alias for
//! `Result<T, StorageError>`. See [`StorageError`] for the possible error variants.

mod error;
mod traits;

pub use error::{StorageError, StorageResult};
pub use traits::{StorageEngine, Transaction};

//! Error types for `lockwait`.
//!
//! This module provides the [`enum@Error`] type returned by the database
//! facade, sessions, and fixtures.

use lockwait_core::CoreError;
use lockwait_storage::StorageError;
use thiserror::Error;

/// Errors that can occur when using the `lockwait` database facade.
#[derive(Debug, Error)]
pub enum Error {
    /// A configuration error occurred.
    #[error("configuration error: {0}")]
    Config(String),

    /// A storage error occurred, including lock conflicts.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A record could not be encoded or decoded.
    #[error("record error: {0}")]
    Core(#[from] CoreError),

    /// A record that must exist was not found.
    #[error("{collection} {id} not found")]
    NotFound {
        /// The collection that was searched.
        collection: &'static str,
        /// The primary key that was looked up.
        id: String,
    },

    /// A seeded record no longer matches its seed value.
    #[error("seed mismatch: {0}")]
    SeedMismatch(String),
}

impl Error {
    /// Returns `true` if a lock request was aborted to break a deadlock.
    #[must_use]
    pub const fn is_deadlock(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_deadlock())
    }

    /// Returns `true` if a lock request gave up waiting.
    #[must_use]
    pub const fn is_lock_timeout(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_lock_timeout())
    }

    /// Returns `true` for either kind of lock conflict.
    ///
    /// Lock conflicts are the expected way for a contended transaction to
    /// fail; everything else is a genuine error.
    #[must_use]
    pub const fn is_lock_conflict(&self) -> bool {
        self.is_deadlock() || self.is_lock_timeout()
    }

    /// Create a config error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a not-found error for a record of the given collection.
    #[must_use]
    pub fn not_found(collection: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound { collection, id: id.to_string() }
    }
}

/// A specialized `Result` type for `lockwait` operations.
pub type Result<T> = std::result::Result<T, Error>;

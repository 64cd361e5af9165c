//! Database handle.
//!
//! [`Database`] owns a storage engine behind an [`Arc`], so cloning it is
//! cheap and clones can be moved into the threads that run concurrent
//! transactions.

use std::path::Path;
use std::sync::Arc;

use lockwait_storage::backends::{MemoryEngine, RedbConfig, RedbEngine};
use lockwait_storage::{LockConfig, LockManager, LockStats, StorageEngine};
use tracing::warn;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::session::Session;

/// A handle to a storage engine with typed, session-based access.
///
/// # Example
///
/// ```
/// use lockwait::Database;
/// use lockwait_core::{Post, PostId};
///
/// let db = Database::in_memory();
///
/// db.with_transaction(|session| session.persist(&Post::new(PostId::new(1), "title")))?;
///
/// let post: Post = db.read(|session| session.get(PostId::new(1)))?;
/// assert_eq!(post.title, "title");
/// # Ok::<(), lockwait::Error>(())
/// ```
pub struct Database<E: StorageEngine = MemoryEngine> {
    engine: Arc<E>,
}

impl<E: StorageEngine> Clone for Database<E> {
    fn clone(&self) -> Self {
        Self { engine: Arc::clone(&self.engine) }
    }
}

impl Database<MemoryEngine> {
    /// Create an empty in-memory database with default locking.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_engine(MemoryEngine::new())
    }

    /// Create an empty in-memory database with the given lock settings.
    #[must_use]
    pub fn in_memory_with_locks(locks: LockConfig) -> Self {
        Self::with_engine(MemoryEngine::with_lock_config(locks))
    }
}

impl Database<RedbEngine> {
    /// Open or create a Redb database file at `path`.
    ///
    /// The lock settings and cache size are taken from `config`; its backend
    /// selection is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the file cannot
    /// be opened.
    pub fn open_redb(path: impl AsRef<Path>, config: &Config) -> Result<Self> {
        config.validate()?;
        let engine = RedbEngine::open_with_config(path, redb_config(config))?;
        Ok(Self::with_engine(engine))
    }

    /// Create a database on Redb's in-memory backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or Redb cannot
    /// create the database.
    pub fn redb_in_memory(config: &Config) -> Result<Self> {
        config.validate()?;
        let engine = RedbEngine::in_memory_with_config(redb_config(config))?;
        Ok(Self::with_engine(engine))
    }
}

fn redb_config(config: &Config) -> RedbConfig {
    let redb = RedbConfig::new().locks(config.locks);
    match config.cache_size {
        Some(bytes) => redb.cache_size(bytes),
        None => redb,
    }
}

impl<E: StorageEngine> Database<E> {
    /// Wrap an existing storage engine.
    pub fn with_engine(engine: E) -> Self {
        Self { engine: Arc::new(engine) }
    }

    /// The underlying storage engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The engine's lock manager.
    pub fn lock_manager(&self) -> &LockManager {
        self.engine.lock_manager()
    }

    /// A snapshot of the engine's lock counters.
    pub fn lock_stats(&self) -> LockStats {
        self.engine.lock_manager().stats()
    }

    /// Begin a read-write session.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started.
    pub fn begin(&self) -> Result<Session<E::Transaction<'_>>> {
        Ok(Session::new(self.engine.begin_write()?))
    }

    /// Begin a read-only session.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started.
    pub fn begin_read(&self) -> Result<Session<E::Transaction<'_>>> {
        Ok(Session::new(self.engine.begin_read()?))
    }

    /// Run `f` in a read-write transaction.
    ///
    /// Commits if `f` returns `Ok` and rolls back if it returns `Err`. The
    /// closure's error is returned as-is; a failed rollback is logged and
    /// does not replace it.
    ///
    /// # Errors
    ///
    /// Returns the closure's error, or the error from beginning or
    /// committing the transaction.
    pub fn with_transaction<'a, T, X, F>(&'a self, f: F) -> std::result::Result<T, X>
    where
        F: FnOnce(&mut Session<E::Transaction<'a>>) -> std::result::Result<T, X>,
        X: From<Error>,
    {
        let mut session = self.begin()?;
        match f(&mut session) {
            Ok(value) => {
                session.commit()?;
                Ok(value)
            }
            Err(e) => {
                let txn = session.id();
                if let Err(rollback) = session.rollback() {
                    warn!(%txn, error = %rollback, "rollback after failed transaction also failed");
                }
                Err(e)
            }
        }
    }

    /// Run `f` in a read-only transaction.
    ///
    /// # Errors
    ///
    /// Returns the closure's error or the error from beginning the
    /// transaction.
    pub fn read<'a, T, F>(&'a self, f: F) -> Result<T>
    where
        F: FnOnce(&Session<E::Transaction<'a>>) -> Result<T>,
    {
        let session = self.begin_read()?;
        let value = f(&session)?;
        session.rollback()?;
        Ok(value)
    }

    /// Flush pending writes to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    pub fn flush(&self) -> Result<()> {
        Ok(self.engine.flush()?)
    }
}

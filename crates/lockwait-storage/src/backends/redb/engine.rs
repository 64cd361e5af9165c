//! Redb storage engine implementation.

use std::path::Path;

use redb::{Database, ReadableTable};
use tracing::info;

use super::tables::{encode_key, DATA_TABLE};
use crate::backends::buffer::WriteOp;
use crate::backends::locking::{CommittedStore, LockingTransaction};
use crate::engine::{StorageEngine, StorageError};
use crate::lock::{LockConfig, LockManager};

/// Configuration options for the Redb storage engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct RedbConfig {
    /// Cache size in bytes.
    /// If not set, uses Redb's default.
    pub cache_size: Option<usize>,

    /// Row lock configuration.
    pub locks: LockConfig,
}

impl RedbConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cache size.
    #[must_use]
    pub const fn cache_size(mut self, size: usize) -> Self {
        self.cache_size = Some(size);
        self
    }

    /// Set the row lock configuration.
    #[must_use]
    pub const fn locks(mut self, locks: LockConfig) -> Self {
        self.locks = locks;
        self
    }
}

/// Committed rows in a Redb database.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Get the underlying Redb database.
    #[must_use]
    pub const fn inner(&self) -> &Database {
        &self.db
    }
}

impl CommittedStore for RedbStore {
    fn read(&self, table: &str, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let tx = self.db.begin_read().map_err(|e| StorageError::Transaction(e.to_string()))?;
        let encoded_key = encode_key(table, key);

        match tx.open_table(DATA_TABLE) {
            Ok(t) => match t.get(encoded_key.as_slice()) {
                Ok(Some(value)) => Ok(Some(value.value().to_vec())),
                Ok(None) => Ok(None),
                Err(e) => Err(StorageError::Internal(e.to_string())),
            },
            // Nothing has been committed yet
            Err(redb::TableError::TableDoesNotExist(_)) => Ok(None),
            Err(e) => Err(StorageError::Internal(e.to_string())),
        }
    }

    fn apply(&self, ops: Vec<WriteOp>) -> Result<(), StorageError> {
        let tx = self.db.begin_write().map_err(|e| StorageError::Transaction(e.to_string()))?;
        {
            let mut t =
                tx.open_table(DATA_TABLE).map_err(|e| StorageError::Internal(e.to_string()))?;
            for op in ops {
                match op {
                    WriteOp::Put { table, key, value } => {
                        t.insert(encode_key(&table, &key).as_slice(), value.as_slice())
                            .map_err(|e| StorageError::Internal(e.to_string()))?;
                    }
                    WriteOp::Delete { table, key } => {
                        t.remove(encode_key(&table, &key).as_slice())
                            .map_err(|e| StorageError::Internal(e.to_string()))?;
                    }
                }
            }
        }
        tx.commit().map_err(|e| StorageError::Transaction(e.to_string()))
    }
}

/// A transaction on a [`RedbEngine`].
pub type RedbTransaction<'a> = LockingTransaction<'a, RedbStore>;

/// A storage engine backed by Redb, with row locks layered on top.
///
/// # Example
///
/// ```ignore
/// use lockwait_storage::backends::RedbEngine;
///
/// let engine = RedbEngine::open("lockwait.redb")?;
///
/// let mut tx = engine.begin_write()?;
/// tx.put("post", b"1", b"hello")?;
/// tx.commit()?;
/// ```
pub struct RedbEngine {
    store: RedbStore,
    locks: LockManager,
}

impl RedbEngine {
    /// Open or create a database at the given path with default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if the database cannot be opened or created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        Self::open_with_config(path, RedbConfig::default())
    }

    /// Open or create a database at the given path with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if the database cannot be opened or created.
    pub fn open_with_config(
        path: impl AsRef<Path>,
        config: RedbConfig,
    ) -> Result<Self, StorageError> {
        let mut builder = Database::builder();

        if let Some(cache_size) = config.cache_size {
            builder.set_cache_size(cache_size);
        }

        let db = builder.create(path.as_ref()).map_err(|e| StorageError::Open(e.to_string()))?;
        info!(path = %path.as_ref().display(), "opened redb database");

        Ok(Self::from_database(db, config.locks))
    }

    /// Create a database in Redb's in-memory backend.
    ///
    /// The database will be lost when the engine is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if the database cannot be created.
    pub fn in_memory() -> Result<Self, StorageError> {
        Self::in_memory_with_config(RedbConfig::default())
    }

    /// Create an in-memory database with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if the database cannot be created.
    pub fn in_memory_with_config(config: RedbConfig) -> Result<Self, StorageError> {
        let db = Database::builder()
            .create_with_backend(redb::backends::InMemoryBackend::new())
            .map_err(|e| StorageError::Open(e.to_string()))?;

        Ok(Self::from_database(db, config.locks))
    }

    fn from_database(db: Database, locks: LockConfig) -> Self {
        Self { store: RedbStore { db }, locks: LockManager::new(locks) }
    }

    /// The committed rows.
    #[must_use]
    pub const fn store(&self) -> &RedbStore {
        &self.store
    }
}

impl StorageEngine for RedbEngine {
    type Transaction<'a> = RedbTransaction<'a>;

    fn begin_read(&self) -> Result<Self::Transaction<'_>, StorageError> {
        Ok(LockingTransaction::new_read(&self.store, &self.locks))
    }

    fn begin_write(&self) -> Result<Self::Transaction<'_>, StorageError> {
        Ok(LockingTransaction::new_write(&self.store, &self.locks))
    }

    fn lock_manager(&self) -> &LockManager {
        &self.locks
    }
}

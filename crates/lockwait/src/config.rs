//! Database configuration.
//!
//! A [`Config`] selects a storage [`Backend`] and the lock manager settings
//! the chosen engine is created with.

use std::path::PathBuf;

use lockwait_storage::LockConfig;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Where committed rows are stored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// An in-process ordered map.
    #[default]
    Memory,
    /// A Redb database file.
    Redb {
        /// Path to the database file; created if missing.
        path: PathBuf,
    },
    /// Redb's in-memory backend.
    RedbInMemory,
}

impl Backend {
    /// A short name for log lines and reports.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Redb { .. } => "redb",
            Self::RedbInMemory => "redb-memory",
        }
    }
}

/// Configuration for opening a [`Database`](crate::Database).
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use lockwait::{Backend, Config};
/// use lockwait_storage::{LockConfig, VictimPolicy};
///
/// let config = Config::new()
///     .backend(Backend::RedbInMemory)
///     .locks(LockConfig::new().victim(VictimPolicy::Youngest))
///     .cache_size(16 * 1024 * 1024);
///
/// assert_eq!(config.backend.name(), "redb-memory");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Storage backend.
    pub backend: Backend,
    /// Lock manager settings.
    pub locks: LockConfig,
    /// Page cache size for Redb backends, in bytes.
    pub cache_size: Option<usize>,
}

impl Config {
    /// Create a configuration for the in-memory backend with default locking.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the storage backend.
    #[must_use]
    pub fn backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    /// Use a Redb database file at `path`.
    #[must_use]
    pub fn redb(self, path: impl Into<PathBuf>) -> Self {
        self.backend(Backend::Redb { path: path.into() })
    }

    /// Set the lock manager settings.
    #[must_use]
    pub const fn locks(mut self, locks: LockConfig) -> Self {
        self.locks = locks;
        self
    }

    /// Set the Redb page cache size.
    #[must_use]
    pub const fn cache_size(mut self, bytes: usize) -> Self {
        self.cache_size = Some(bytes);
        self
    }

    /// Check the configuration for values no engine can be opened with.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an empty Redb path or a zero lock wait
    /// timeout.
    pub fn validate(&self) -> Result<()> {
        if let Backend::Redb { path } = &self.backend {
            if path.as_os_str().is_empty() {
                return Err(Error::config("redb backend requires a database path"));
            }
        }
        if self.locks.wait_timeout.is_zero() {
            return Err(Error::config("lock wait timeout must be greater than zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use lockwait_storage::DeadlockDetection;

    use super::*;

    #[test]
    fn test_default_is_memory() {
        let config = Config::default();
        assert_eq!(config.backend, Backend::Memory);
        assert_eq!(config.locks, LockConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = Config::new()
            .redb("/tmp/lockwait.redb")
            .locks(LockConfig::timeout_only(Duration::from_millis(50)))
            .cache_size(1024);

        assert_eq!(config.backend.name(), "redb");
        assert_eq!(config.locks.detection, DeadlockDetection::TimeoutOnly);
        assert_eq!(config.cache_size, Some(1024));
    }

    #[test]
    fn test_validate_rejects_empty_path() {
        let err = Config::new().redb("").validate().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_validate_rejects_zero_wait() {
        let config = Config::new().locks(LockConfig::new().wait_timeout(Duration::ZERO));
        assert!(config.validate().is_err());
    }
}

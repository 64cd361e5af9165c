//! Identifiers used by the lock manager.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a transaction, assigned by the engine's lock manager.
///
/// Ids increase monotonically, so a larger id means a younger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TxnId(u64);

impl TxnId {
    /// Create a transaction id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw id value.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx{}", self.0)
    }
}

/// A lockable row: a key within a table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LockKey {
    table: String,
    key: Vec<u8>,
}

impl LockKey {
    /// Create a lock key for a row.
    pub fn new(table: impl Into<String>, key: impl Into<Vec<u8>>) -> Self {
        Self { table: table.into(), key: key.into() }
    }

    /// The table the row belongs to.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The row's key bytes.
    #[must_use]
    pub fn key(&self) -> &[u8] {
        &self.key
    }
}

impl fmt::Display for LockKey {
    /// Eight-byte keys are shown as the big-endian integer they encode,
    /// anything else as hex.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Ok(bytes) = <[u8; 8]>::try_from(self.key.as_slice()) {
            write!(f, "{}/{}", self.table, u64::from_be_bytes(bytes))
        } else {
            write!(f, "{}/0x", self.table)?;
            for b in &self.key {
                write!(f, "{b:02x}")?;
            }
            Ok(())
        }
    }
}

//! Identifier types for records.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Primary key of a [`Post`](super::Post).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PostId(u64);

impl PostId {
    /// Create a new post ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for PostId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Primary key of a [`PostComment`](super::PostComment).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CommentId(u64);

impl CommentId {
    /// Create a new comment ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for CommentId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(PostId::new(42).to_string(), "42");
        assert_eq!(CommentId::new(7).to_string(), "7");
    }

    #[test]
    fn test_ordering() {
        assert!(PostId::new(1) < PostId::new(2));
        assert_eq!(CommentId::from(3), CommentId::new(3));
    }
}

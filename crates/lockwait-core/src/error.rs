//! Error types for the core crate.

use thiserror::Error;

/// Errors that can occur in the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A record could not be encoded.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Stored bytes could not be decoded into a record.
    #[error("decoding error: {0}")]
    Decoding(String),

    /// A record failed validation.
    #[error("validation error: {0}")]
    Validation(String),
}

impl CoreError {
    /// Create a decoding error.
    #[must_use]
    pub fn decoding(msg: impl Into<String>) -> Self {
        Self::Decoding(msg.into())
    }
}

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

//! Encoding and decoding traits for serialization.

use crate::CoreError;

/// A trait for types that can be encoded to bytes.
pub trait Encoder: Sized {
    /// Encode this value to bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails (e.g., a string too long for its
    /// length prefix).
    fn encode(&self) -> Result<Vec<u8>, CoreError> {
        let mut buf = Vec::new();
        self.encode_to(&mut buf)?;
        Ok(buf)
    }

    /// Encode this value into a pre-allocated buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    fn encode_to(&self, buf: &mut Vec<u8>) -> Result<(), CoreError>;
}

/// A trait for types that can be decoded from bytes.
pub trait Decoder: Sized {
    /// Decode a value from bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails (e.g., invalid data, truncated input).
    fn decode(bytes: &[u8]) -> Result<Self, CoreError>;
}

/// Format version for serialized data.
pub const FORMAT_VERSION: u8 = 1;

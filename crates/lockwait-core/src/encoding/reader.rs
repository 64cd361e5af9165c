//! Primitive readers and writers shared by the record encoders.

use crate::CoreError;

use super::FORMAT_VERSION;

/// Append a `u32` length-prefixed UTF-8 string.
pub(super) fn write_str(buf: &mut Vec<u8>, value: &str, what: &str) -> Result<(), CoreError> {
    let bytes = value.as_bytes();
    let len = u32::try_from(bytes.len())
        .map_err(|_| CoreError::Encoding(format!("{what} too long")))?;
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(bytes);
    Ok(())
}

/// A forward-only cursor over encoded bytes.
pub(super) struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Start reading a record, checking the format version byte.
    pub(super) fn open(bytes: &'a [u8]) -> Result<Self, CoreError> {
        let Some((&version, _)) = bytes.split_first() else {
            return Err(CoreError::decoding("empty input"));
        };
        if version != FORMAT_VERSION {
            return Err(CoreError::decoding(format!(
                "unsupported format version: {version}, expected {FORMAT_VERSION}"
            )));
        }
        Ok(Self { bytes, pos: 1 })
    }

    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8], CoreError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| CoreError::decoding(format!("truncated input reading {what}")))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub(super) fn read_u64(&mut self, what: &str) -> Result<u64, CoreError> {
        let bytes = self.take(8, what)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(bytes);
        Ok(u64::from_be_bytes(arr))
    }

    pub(super) fn read_str(&mut self, what: &str) -> Result<String, CoreError> {
        let len_bytes = self.take(4, what)?;
        let mut arr = [0u8; 4];
        arr.copy_from_slice(len_bytes);
        let len = u32::from_be_bytes(arr) as usize;
        let bytes = self.take(len, what)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| CoreError::decoding(format!("invalid UTF-8 in {what}: {e}")))
    }

    /// Finish reading, rejecting any unread bytes.
    pub(super) fn finish(self) -> Result<(), CoreError> {
        let remaining = self.bytes.len() - self.pos;
        if remaining == 0 {
            Ok(())
        } else {
            Err(CoreError::decoding(format!("{remaining} trailing bytes")))
        }
    }
}

//! Per-transaction write buffering.

use std::collections::HashMap;

/// A single buffered write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Put a key-value pair.
    Put {
        /// The table name.
        table: String,
        /// The key.
        key: Vec<u8>,
        /// The value.
        value: Vec<u8>,
    },
    /// Delete a key.
    Delete {
        /// The table name.
        table: String,
        /// The key.
        key: Vec<u8>,
    },
}

/// A buffer of writes for a single transaction.
///
/// The transaction reads its own writes through [`WriteBuffer::get`] before
/// falling back to committed data.
#[derive(Debug, Default)]
pub struct WriteBuffer {
    /// Operations in the order they were applied.
    ops: Vec<WriteOp>,
    /// Latest operation per (table, key): index into `ops`, or `None` if deleted.
    index: HashMap<(String, Vec<u8>), Option<usize>>,
}

impl WriteBuffer {
    /// Create a new empty write buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a put operation.
    pub fn put(&mut self, table: &str, key: &[u8], value: &[u8]) {
        let idx = self.ops.len();
        self.ops.push(WriteOp::Put {
            table: table.to_owned(),
            key: key.to_vec(),
            value: value.to_vec(),
        });
        self.index.insert((table.to_owned(), key.to_vec()), Some(idx));
    }

    /// Record a delete operation.
    pub fn delete(&mut self, table: &str, key: &[u8]) {
        self.ops.push(WriteOp::Delete { table: table.to_owned(), key: key.to_vec() });
        self.index.insert((table.to_owned(), key.to_vec()), None);
    }

    /// Get a value from the buffer, if written.
    ///
    /// Returns:
    /// - `Some(Some(value))` if the key was written
    /// - `Some(None)` if the key was deleted
    /// - `None` if the key was not touched by this buffer
    #[must_use]
    pub fn get(&self, table: &str, key: &[u8]) -> Option<Option<&[u8]>> {
        self.index.get(&(table.to_owned(), key.to_vec())).map(|idx| {
            idx.and_then(|i| match &self.ops[i] {
                WriteOp::Put { value, .. } => Some(value.as_slice()),
                WriteOp::Delete { .. } => None,
            })
        })
    }

    /// Get the number of operations in the buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Check if the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Take ownership of all operations.
    #[must_use]
    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_your_own_writes() {
        let mut buffer = WriteBuffer::new();
        assert_eq!(buffer.get("t", b"k"), None);

        buffer.put("t", b"k", b"v1");
        buffer.put("t", b"k", b"v2");
        assert_eq!(buffer.get("t", b"k"), Some(Some(&b"v2"[..])));

        buffer.delete("t", b"k");
        assert_eq!(buffer.get("t", b"k"), Some(None));
        assert_eq!(buffer.get("other", b"k"), None);
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn test_ops_keep_order() {
        let mut buffer = WriteBuffer::new();
        buffer.put("t", b"a", b"1");
        buffer.delete("t", b"b");

        let ops = buffer.into_ops();
        assert_eq!(
            ops,
            vec![
                WriteOp::Put { table: "t".into(), key: b"a".to_vec(), value: b"1".to_vec() },
                WriteOp::Delete { table: "t".into(), key: b"b".to_vec() },
            ]
        );
    }
}

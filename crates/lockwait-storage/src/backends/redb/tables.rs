//! Redb table definitions and key encoding utilities.
//!
//! Redb requires static table names, so logical tables are stored in one
//! physical table with the logical table name prefixed to every key.

use redb::TableDefinition;

/// The physical table that stores all rows.
pub const DATA_TABLE: TableDefinition<'static, &[u8], &[u8]> =
    TableDefinition::new("lockwait_data");

/// Separator byte between table name and key in the encoded key.
pub const KEY_SEPARATOR: u8 = 0x00;

/// Encode a logical table name and key into a physical key.
///
/// The format is: `<table_name><separator><key>`
#[must_use]
pub fn encode_key(table: &str, key: &[u8]) -> Vec<u8> {
    let mut encoded = Vec::with_capacity(table.len() + 1 + key.len());
    encoded.extend_from_slice(table.as_bytes());
    encoded.push(KEY_SEPARATOR);
    encoded.extend_from_slice(key);
    encoded
}

/// Decode a physical key into its logical table name and original key.
///
/// Returns `None` if the key is malformed (missing separator).
#[must_use]
pub fn decode_key(encoded: &[u8]) -> Option<(&str, &[u8])> {
    let sep_pos = encoded.iter().position(|&b| b == KEY_SEPARATOR)?;
    let table = std::str::from_utf8(&encoded[..sep_pos]).ok()?;
    Some((table, &encoded[sep_pos + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_key() {
        let encoded = encode_key("post_comment", &1u64.to_be_bytes());
        let (table, key) = decode_key(&encoded).unwrap();
        assert_eq!(table, "post_comment");
        assert_eq!(key, &1u64.to_be_bytes());
    }

    #[test]
    fn test_tables_do_not_collide() {
        // "post" is a prefix of "post_comment"; the separator keeps them apart.
        let post = encode_key("post", b"1");
        let comment = encode_key("post_comment", b"1");
        assert_ne!(post, comment);
        assert!(!comment.starts_with(&encode_key("post", b"")));
    }

    #[test]
    fn test_decode_malformed() {
        assert_eq!(decode_key(b"no-separator"), None);
    }
}

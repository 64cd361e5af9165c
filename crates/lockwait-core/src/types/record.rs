//! Mapping between record types and storage collections.

use std::fmt;
use std::hash::Hash;

use crate::encoding::{Decoder, Encoder};

/// A record type stored in a named collection under a primary key.
///
/// The collection name becomes the storage table name, and [`Record::key`]
/// produces the key bytes. Row locks are taken on the same
/// `(collection, key)` pair, so two records lock independently exactly when
/// their keys differ.
pub trait Record: Encoder + Decoder {
    /// The primary key type.
    type Id: Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync;

    /// The collection (table) name.
    const COLLECTION: &'static str;

    /// The primary key of this record.
    fn id(&self) -> Self::Id;

    /// Encode a primary key as storage key bytes.
    fn key(id: Self::Id) -> Vec<u8>;
}

//! Core record types.
//!
//! - [`PostId`], [`CommentId`] - Primary keys
//! - [`Post`] - The parent record
//! - [`PostComment`] - The child record, referencing exactly one [`Post`]
//! - [`Record`] - Maps a record type onto a storage collection

mod ids;
mod post;
mod record;

pub use ids::{CommentId, PostId};
pub use post::{Post, PostComment};
pub use record::Record;

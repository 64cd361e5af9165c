//! Binary encoding for records.
//!
//! Records are stored as compact byte strings. Every encoded record starts
//! with a [`FORMAT_VERSION`] byte, followed by big-endian identifiers and
//! `u32` length-prefixed UTF-8 strings.
//!
//! # Example
//!
//! ```
//! use lockwait_core::encoding::{Decoder, Encoder};
//! use lockwait_core::{CommentId, PostComment, PostId};
//!
//! let comment = PostComment::new(CommentId::new(1), PostId::new(1), "Awesome!");
//! let bytes = comment.encode().unwrap();
//! assert_eq!(PostComment::decode(&bytes).unwrap(), comment);
//! ```

mod reader;
mod records;
mod traits;


pub use traits::{Decoder, Encoder, FORMAT_VERSION};

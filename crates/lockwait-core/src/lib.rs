//! `lockwait` Core
//!
//! This crate provides the record types shared by the `lockwait` crates: the
//! parent [`Post`] and child [`PostComment`] rows that the deadlock harness
//! locks, their identifiers, and the binary format used to store them.
//!
//! # Overview
//!
//! - **Identifiers**: [`PostId`] and [`CommentId`] newtypes
//! - **Records**: [`Post`] (parent) and [`PostComment`] (child, many-to-one)
//! - **Mapping**: the [`Record`] trait ties a record type to its collection
//!   name and primary-key encoding
//!
//! # Example
//!
//! ```
//! use lockwait_core::{Post, PostComment, PostId, CommentId, Record};
//! use lockwait_core::encoding::{Decoder, Encoder};
//!
//! let post = Post::new(PostId::new(1), "High-Performance Java Persistence");
//! let comment = PostComment::new(CommentId::new(1), post.id, "Awesome!");
//!
//! assert_eq!(Post::COLLECTION, "post");
//! assert_eq!(comment.post_id, post.id);
//!
//! let bytes = post.encode().unwrap();
//! assert_eq!(Post::decode(&bytes).unwrap(), post);
//! ```
//!
//! # Modules
//!
//! - [`types`] - Identifiers, records, and the [`Record`] mapping trait
//! - [`encoding`] - Binary encoding for records
//! - [`error`] - Error types ([`CoreError`])

#![deny(clippy::unwrap_used)]

pub mod encoding;
pub mod error;
pub mod types;

pub use error::{CoreError, CoreResult};
pub use types::{CommentId, Post, PostComment, PostId, Record};

//! Serialization for [`Post`] and [`PostComment`].
//!
//! # Format
//!
//! A post is encoded as:
//! - 1 byte format version
//! - 8 bytes post ID (big-endian u64)
//! - 4 bytes title length + UTF-8 bytes
//!
//! A comment is encoded as:
//! - 1 byte format version
//! - 8 bytes comment ID (big-endian u64)
//! - 8 bytes parent post ID (big-endian u64)
//! - 4 bytes review length + UTF-8 bytes

use crate::error::CoreError;
use crate::types::{CommentId, Post, PostComment, PostId};

use super::reader::{write_str, Reader};
use super::traits::{Decoder, Encoder, FORMAT_VERSION};

impl Encoder for Post {
    fn encode_to(&self, buf: &mut Vec<u8>) -> Result<(), CoreError> {
        buf.push(FORMAT_VERSION);
        buf.extend_from_slice(&self.id.as_u64().to_be_bytes());
        write_str(buf, &self.title, "post title")
    }
}

impl Decoder for Post {
    fn decode(bytes: &[u8]) -> Result<Self, CoreError> {
        let mut reader = Reader::open(bytes)?;
        let id = PostId::new(reader.read_u64("post id")?);
        let title = reader.read_str("post title")?;
        reader.finish()?;
        Ok(Self { id, title })
    }
}

impl Encoder for PostComment {
    fn encode_to(&self, buf: &mut Vec<u8>) -> Result<(), CoreError> {
        buf.push(FORMAT_VERSION);
        buf.extend_from_slice(&self.id.as_u64().to_be_bytes());
        buf.extend_from_slice(&self.post_id.as_u64().to_be_bytes());
        write_str(buf, &self.review, "comment review")
    }
}

impl Decoder for PostComment {
    fn decode(bytes: &[u8]) -> Result<Self, CoreError> {
        let mut reader = Reader::open(bytes)?;
        let id = CommentId::new(reader.read_u64("comment id")?);
        let post_id = PostId::new(reader.read_u64("comment post id")?);
        let review = reader.read_str("comment review")?;
        reader.finish()?;
        Ok(Self { id, post_id, review })
    }
}

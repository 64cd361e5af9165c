//! The parent and child records locked by the deadlock scenario.

use serde::{Deserialize, Serialize};

use super::{CommentId, PostId, Record};

/// A blog post: the parent side of the post/comment relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Primary key.
    pub id: PostId,
    /// Post title.
    pub title: String,
}

impl Post {
    /// Create a new post.
    #[must_use]
    pub fn new(id: PostId, title: impl Into<String>) -> Self {
        Self { id, title: title.into() }
    }
}

impl Record for Post {
    type Id = PostId;

    const COLLECTION: &'static str = "post";

    fn id(&self) -> PostId {
        self.id
    }

    fn key(id: PostId) -> Vec<u8> {
        id.as_u64().to_be_bytes().to_vec()
    }
}

/// A comment on a post.
///
/// Each comment references exactly one post by id. The reference is not
/// resolved eagerly; load the parent with a separate lookup when needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostComment {
    /// Primary key.
    pub id: CommentId,
    /// The post this comment belongs to.
    pub post_id: PostId,
    /// Free-text review.
    pub review: String,
}

impl PostComment {
    /// Create a new comment on the given post.
    #[must_use]
    pub fn new(id: CommentId, post_id: PostId, review: impl Into<String>) -> Self {
        Self { id, post_id, review: review.into() }
    }
}

impl Record for PostComment {
    type Id = CommentId;

    const COLLECTION: &'static str = "post_comment";

    fn id(&self) -> CommentId {
        self.id
    }

    fn key(id: CommentId) -> Vec<u8> {
        id.as_u64().to_be_bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collections_are_distinct() {
        assert_ne!(Post::COLLECTION, PostComment::COLLECTION);
    }

    #[test]
    fn test_keys_sort_by_id() {
        assert!(Post::key(PostId::new(2)) < Post::key(PostId::new(10)));
        assert!(PostComment::key(CommentId::new(255)) < PostComment::key(CommentId::new(256)));
    }

    #[test]
    fn test_comment_references_post() {
        let post = Post::new(PostId::new(1), "title");
        let comment = PostComment::new(CommentId::new(9), post.id, "nice");
        assert_eq!(comment.post_id, post.id());
        assert_eq!(comment.id(), CommentId::new(9));
    }
}

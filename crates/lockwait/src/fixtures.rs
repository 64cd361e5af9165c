//! Seed data for the deadlock scenario.
//!
//! One parent post and one child comment that references it. Both are
//! committed before the concurrent phase and must be unchanged after it.

use lockwait_core::{CommentId, Post, PostComment, PostId};
use lockwait_storage::StorageEngine;
use tracing::debug;

use crate::database::Database;
use crate::error::{Error, Result};

/// Id of the seeded parent post.
pub const SEED_POST_ID: PostId = PostId::new(1);

/// Id of the seeded child comment.
pub const SEED_COMMENT_ID: CommentId = CommentId::new(1);

/// Title of the seeded post.
pub const SEED_POST_TITLE: &str = "High-Performance Java Persistence";

/// Review text of the seeded comment.
pub const SEED_COMMENT_REVIEW: &str = "Awesome!";

/// The seeded parent post.
#[must_use]
pub fn seed_post() -> Post {
    Post::new(SEED_POST_ID, SEED_POST_TITLE)
}

/// The seeded child comment.
#[must_use]
pub fn seed_comment() -> PostComment {
    PostComment::new(SEED_COMMENT_ID, SEED_POST_ID, SEED_COMMENT_REVIEW)
}

/// Insert the seed post and comment in one transaction.
///
/// Existing rows with the same ids are overwritten.
///
/// # Errors
///
/// Returns an error if the transaction fails.
pub fn seed<E: StorageEngine>(db: &Database<E>) -> Result<()> {
    db.with_transaction(|session| {
        session.persist(&seed_post())?;
        session.persist(&seed_comment())
    })?;
    debug!(post = %SEED_POST_ID, comment = %SEED_COMMENT_ID, "seed data committed");
    Ok(())
}

/// Re-read the seed rows and check they still hold their seed values.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if a seed row is missing and
/// [`Error::SeedMismatch`] if one was modified.
pub fn verify_seed<E: StorageEngine>(db: &Database<E>) -> Result<()> {
    let (post, comment) = db.read(|session| {
        Ok((session.get::<Post>(SEED_POST_ID)?, session.get::<PostComment>(SEED_COMMENT_ID)?))
    })?;

    let expected = seed_post();
    if post != expected {
        return Err(Error::SeedMismatch(format!("expected {expected:?}, found {post:?}")));
    }
    let expected = seed_comment();
    if comment != expected {
        return Err(Error::SeedMismatch(format!("expected {expected:?}, found {comment:?}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_values() {
        let post = seed_post();
        let comment = seed_comment();
        assert_eq!(post.title, "High-Performance Java Persistence");
        assert_eq!(comment.review, "Awesome!");
        assert_eq!(comment.post_id, post.id);
    }

    #[test]
    fn test_seed_then_verify() {
        let db = Database::in_memory();
        seed(&db).unwrap();
        verify_seed(&db).unwrap();
        // Seeding twice is harmless.
        seed(&db).unwrap();
        verify_seed(&db).unwrap();
    }

    #[test]
    fn test_verify_unseeded_is_not_found() {
        let db = Database::in_memory();
        assert!(matches!(verify_seed(&db), Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_verify_detects_modification() {
        let db = Database::in_memory();
        seed(&db).unwrap();
        db.with_transaction(|s| s.persist(&Post::new(SEED_POST_ID, "changed"))).unwrap();

        let err = verify_seed(&db).unwrap_err();
        assert!(matches!(err, Error::SeedMismatch(_)));
    }
}

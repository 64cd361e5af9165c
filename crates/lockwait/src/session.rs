//! Typed record access within one storage transaction.
//!
//! A [`Session`] maps [`Record`] types onto their collections and keys, so
//! callers read, lock, and write `Post` and `PostComment` values instead of
//! raw bytes. Sessions are usually obtained through
//! [`Database::with_transaction`](crate::Database::with_transaction), which
//! commits or rolls back around a closure.

use std::time::Duration;

use lockwait_core::Record;
use lockwait_storage::{LockKey, Transaction, TxnId};

use crate::error::{Error, Result};

/// A storage transaction with typed record operations.
pub struct Session<T: Transaction> {
    tx: T,
}

impl<T: Transaction> Session<T> {
    /// Wrap a storage transaction.
    pub const fn new(tx: T) -> Self {
        Self { tx }
    }

    /// The id of the underlying transaction.
    pub fn id(&self) -> TxnId {
        self.tx.id()
    }

    /// Store a record, replacing any previous value under its id.
    ///
    /// Takes the record's row lock.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be encoded, the row lock
    /// cannot be acquired, or the transaction is read-only.
    pub fn persist<R: Record>(&mut self, record: &R) -> Result<()> {
        let bytes = record.encode()?;
        self.tx.put(R::COLLECTION, &R::key(record.id()), &bytes)?;
        Ok(())
    }

    /// Read a record without locking it.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails or the stored bytes do not decode.
    pub fn find<R: Record>(&self, id: R::Id) -> Result<Option<R>> {
        let bytes = self.tx.get(R::COLLECTION, &R::key(id))?;
        bytes.map(|b| R::decode(&b).map_err(Error::from)).transpose()
    }

    /// Read a record, failing with [`Error::NotFound`] if it is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the record is missing or cannot be read.
    pub fn get<R: Record>(&self, id: R::Id) -> Result<R> {
        self.find(id)?.ok_or_else(|| Error::not_found(R::COLLECTION, id))
    }

    /// Lock a record's row for writing, then read it.
    ///
    /// Blocks while another transaction holds the row. `timeout` bounds the
    /// wait; `None` uses the engine's configured default. The lock is held
    /// until the session commits or rolls back.
    ///
    /// # Errors
    ///
    /// Returns a lock conflict (see [`Error::is_lock_conflict`]) if the
    /// request was chosen as a deadlock victim or timed out, or any other
    /// error the read produces.
    pub fn find_for_update<R: Record>(
        &mut self,
        id: R::Id,
        timeout: Option<Duration>,
    ) -> Result<Option<R>> {
        let bytes = self.tx.get_for_update(R::COLLECTION, &R::key(id), timeout)?;
        bytes.map(|b| R::decode(&b).map_err(Error::from)).transpose()
    }

    /// Delete a record. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the row lock cannot be acquired or the
    /// transaction is read-only.
    pub fn remove<R: Record>(&mut self, id: R::Id) -> Result<bool> {
        Ok(self.tx.delete(R::COLLECTION, &R::key(id))?)
    }

    /// The row locks this session currently holds.
    pub fn held_locks(&self) -> Vec<LockKey> {
        self.tx.held_locks()
    }

    /// Commit the session's writes and release its locks.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails.
    pub fn commit(self) -> Result<()> {
        Ok(self.tx.commit()?)
    }

    /// Discard the session's writes and release its locks.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback fails.
    pub fn rollback(self) -> Result<()> {
        Ok(self.tx.rollback()?)
    }
}

#[cfg(test)]
mod tests {
    use lockwait_core::{CommentId, Post, PostComment, PostId};
    use lockwait_storage::backends::MemoryEngine;
    use lockwait_storage::StorageEngine;

    use super::*;

    #[test]
    fn test_persist_and_find() {
        let engine = MemoryEngine::new();
        let mut session = Session::new(engine.begin_write().unwrap());

        let post = Post::new(PostId::new(1), "title");
        session.persist(&post).unwrap();
        assert_eq!(session.find::<Post>(post.id).unwrap(), Some(post.clone()));
        session.commit().unwrap();

        let session = Session::new(engine.begin_read().unwrap());
        assert_eq!(session.get::<Post>(PostId::new(1)).unwrap(), post);
        assert!(session.find::<PostComment>(CommentId::new(1)).unwrap().is_none());
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let engine = MemoryEngine::new();
        let session = Session::new(engine.begin_read().unwrap());

        let err = session.get::<Post>(PostId::new(9)).unwrap_err();
        assert!(matches!(err, Error::NotFound { collection: "post", .. }));
    }

    #[test]
    fn test_find_for_update_holds_lock() {
        let engine = MemoryEngine::new();
        let mut session = Session::new(engine.begin_write().unwrap());

        let found = session.find_for_update::<Post>(PostId::new(1), None).unwrap();
        assert!(found.is_none());
        assert_eq!(session.held_locks(), vec![LockKey::new("post", 1u64.to_be_bytes())]);

        session.rollback().unwrap();
        assert!(engine.lock_manager().holder(&LockKey::new("post", 1u64.to_be_bytes())).is_none());
    }

    #[test]
    fn test_remove() {
        let engine = MemoryEngine::new();
        let comment = PostComment::new(CommentId::new(3), PostId::new(1), "ok");

        let mut session = Session::new(engine.begin_write().unwrap());
        session.persist(&comment).unwrap();
        session.commit().unwrap();

        let mut session = Session::new(engine.begin_write().unwrap());
        assert!(session.remove::<PostComment>(comment.id).unwrap());
        assert!(!session.remove::<PostComment>(CommentId::new(4)).unwrap());
        session.commit().unwrap();

        let session = Session::new(engine.begin_read().unwrap());
        assert!(session.find::<PostComment>(comment.id).unwrap().is_none());
    }
}

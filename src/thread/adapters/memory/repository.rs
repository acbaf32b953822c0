//! Thread repository backed by a single write lock.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::thread::{
    domain::{Thread, ThreadId, ThreadKey},
    ports::{ThreadInsertOutcome, ThreadRepository, ThreadRepositoryError, ThreadRepositoryResult},
};

/// Thread-safe in-memory thread repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryThreadRepository {
    state: Arc<RwLock<InMemoryThreadState>>,
}

#[derive(Debug, Default)]
struct InMemoryThreadState {
    threads: HashMap<ThreadId, Thread>,
    key_index: HashMap<ThreadKey, ThreadId>,
}

impl InMemoryThreadRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored threads.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadRepositoryError::Persistence`] if the lock is poisoned.
    pub fn len(&self) -> ThreadRepositoryResult<usize> {
        let state = self.state.read().map_err(|err| {
            ThreadRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(state.threads.len())
    }

    /// Returns `true` when no thread has been stored.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadRepositoryError::Persistence`] if the lock is poisoned.
    pub fn is_empty(&self) -> ThreadRepositoryResult<bool> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl ThreadRepository for InMemoryThreadRepository {
    async fn insert_if_absent(&self, candidate: &Thread) -> ThreadRepositoryResult<ThreadInsertOutcome> {
        let mut state = self.state.write().map_err(|err| {
            ThreadRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;

        if let Some(existing) = state
            .key_index
            .get(candidate.key())
            .and_then(|id| state.threads.get(id))
        {
            return Ok(ThreadInsertOutcome::Existing(existing.clone()));
        }

        state.key_index.insert(candidate.key().clone(), candidate.id());
        state.threads.insert(candidate.id(), candidate.clone());
        Ok(ThreadInsertOutcome::Created(candidate.clone()))
    }

    async fn find_by_id(&self, id: ThreadId) -> ThreadRepositoryResult<Option<Thread>> {
        let state = self.state.read().map_err(|err| {
            ThreadRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(state.threads.get(&id).cloned())
    }

    async fn find_by_key(&self, key: &ThreadKey) -> ThreadRepositoryResult<Option<Thread>> {
        let state = self.state.read().map_err(|err| {
            ThreadRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(state
            .key_index
            .get(key)
            .and_then(|id| state.threads.get(id))
            .cloned())
    }
}

//! Repository port for thread persistence.

use crate::thread::domain::{Thread, ThreadId, ThreadKey};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for thread repository operations.
pub type ThreadRepositoryResult<T> = Result<T, ThreadRepositoryError>;

/// Outcome of an insert-if-absent call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadInsertOutcome {
    /// The candidate thread was stored.
    Created(Thread),
    /// Another thread already held the key; it is returned unchanged.
    Existing(Thread),
}

impl ThreadInsertOutcome {
    /// Returns the thread that now owns the key.
    #[must_use]
    pub fn into_thread(self) -> Thread {
        match self {
            Self::Created(thread) | Self::Existing(thread) => thread,
        }
    }
}

/// Thread persistence contract.
///
/// Implementations must enforce uniqueness of the key triple so that
/// concurrent first writers converge on one thread.
#[async_trait]
pub trait ThreadRepository: Send + Sync {
    /// Stores `candidate` unless a thread with the same key exists.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadRepositoryError::Persistence`] when storage fails.
    async fn insert_if_absent(&self, candidate: &Thread) -> ThreadRepositoryResult<ThreadInsertOutcome>;

    /// Finds a thread by identifier.
    async fn find_by_id(&self, id: ThreadId) -> ThreadRepositoryResult<Option<Thread>>;

    /// Finds a thread by key.
    async fn find_by_key(&self, key: &ThreadKey) -> ThreadRepositoryResult<Option<Thread>>;
}

/// Errors returned by thread repository implementations.
#[derive(Debug, Clone, Error)]
pub enum ThreadRepositoryError {
    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ThreadRepositoryError {
    /// Wraps a data-quality error from persisted rows.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

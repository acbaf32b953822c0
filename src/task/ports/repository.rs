//! Repository port for task persistence and compare-and-set transitions.

use crate::task::domain::{Task, TaskCompletion, TaskId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Outcome of a compare-and-set transition.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskTransition {
    /// The task was pending and now holds the requested terminal state.
    Applied(Task),
    /// Another transition won; the current terminal task is returned.
    AlreadyTerminal(Task),
}

/// Task persistence contract.
///
/// [`TaskRepository::complete`] must be atomic: of several concurrent
/// completions of one pending task exactly one observes
/// [`TaskTransition::Applied`].
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the task ID already
    /// exists.
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Moves a pending task to a terminal state.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn complete(
        &self,
        id: TaskId,
        completion: TaskCompletion,
    ) -> TaskRepositoryResult<TaskTransition>;

    /// Returns every pending task, oldest first.
    async fn list_pending(&self) -> TaskRepositoryResult<Vec<Task>>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

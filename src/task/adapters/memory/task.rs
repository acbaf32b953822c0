//! In-memory repository for tasks.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::task::{
    domain::{Task, TaskCompletion, TaskDomainError, TaskId},
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult, TaskTransition},
};

/// Thread-safe in-memory task repository.
///
/// Completions run under the write lock, which makes the pending check and
/// the update one atomic step.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<HashMap<TaskId, Task>>>,
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(err: impl std::fmt::Display) -> TaskRepositoryError {
    TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut tasks = self.state.write().map_err(poisoned)?;
        if tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }
        tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let tasks = self.state.read().map_err(poisoned)?;
        Ok(tasks.get(&id).cloned())
    }

    async fn complete(
        &self,
        id: TaskId,
        completion: TaskCompletion,
    ) -> TaskRepositoryResult<TaskTransition> {
        let mut tasks = self.state.write().map_err(poisoned)?;
        let current = tasks.get(&id).ok_or(TaskRepositoryError::NotFound(id))?;
        match current.complete(completion) {
            Ok(completed) => {
                tasks.insert(id, completed.clone());
                Ok(TaskTransition::Applied(completed))
            }
            Err(TaskDomainError::AlreadyTerminal(_)) => {
                Ok(TaskTransition::AlreadyTerminal(current.clone()))
            }
            Err(err) => Err(TaskRepositoryError::persistence(err)),
        }
    }

    async fn list_pending(&self) -> TaskRepositoryResult<Vec<Task>> {
        let tasks = self.state.read().map_err(poisoned)?;
        let mut pending: Vec<Task> = tasks
            .values()
            .filter(|task| !task.state().is_terminal())
            .cloned()
            .collect();
        pending.sort_by_key(Task::created_at);
        Ok(pending)
    }
}

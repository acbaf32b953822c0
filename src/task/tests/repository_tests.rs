//! Tests for the in-memory task repository.

use crate::task::{
    adapters::memory::InMemoryTaskRepository,
    domain::{Task, TaskCompletion, TaskId, TaskState},
    ports::{TaskRepository, TaskRepositoryError, TaskTransition},
};
use mockable::DefaultClock;
use rstest::rstest;

use super::fixtures::approval;

fn pending_task() -> Task {
    Task::new(approval(None), &DefaultClock).expect("valid task")
}

#[rstest]
#[tokio::test]
async fn store_rejects_duplicates() {
    let repository = InMemoryTaskRepository::new();
    let task = pending_task();
    repository.store(&task).await.expect("first store");

    let result = repository.store(&task).await;

    assert!(matches!(result, Err(TaskRepositoryError::DuplicateTask(id)) if id == task.id()));
}

#[rstest]
#[tokio::test]
async fn first_completion_wins() {
    let repository = InMemoryTaskRepository::new();
    let task = pending_task();
    repository.store(&task).await.expect("store");

    let first = repository
        .complete(task.id(), TaskCompletion::by_action("reject", None, &DefaultClock))
        .await
        .expect("first completion");
    let second = repository
        .complete(task.id(), TaskCompletion::by_timeout(&DefaultClock))
        .await
        .expect("second completion");

    assert!(matches!(first, TaskTransition::Applied(ref t) if t.state() == TaskState::CompletedByAction));
    let TaskTransition::AlreadyTerminal(current) = second else {
        panic!("expected the second completion to lose");
    };
    assert_eq!(current.state(), TaskState::CompletedByAction);
    assert_eq!(
        current.outcome().and_then(|o| o.performed_action.as_deref()),
        Some("reject")
    );
}

#[rstest]
#[tokio::test]
async fn completing_unknown_task_fails() {
    let repository = InMemoryTaskRepository::new();
    let id = TaskId::new();

    let result = repository
        .complete(id, TaskCompletion::by_timeout(&DefaultClock))
        .await;

    assert!(matches!(result, Err(TaskRepositoryError::NotFound(missing)) if missing == id));
}

#[rstest]
#[tokio::test]
async fn list_pending_skips_terminal_tasks() {
    let repository = InMemoryTaskRepository::new();
    let open = pending_task();
    let closed = pending_task();
    repository.store(&open).await.expect("store open");
    repository.store(&closed).await.expect("store closed");
    repository
        .complete(closed.id(), TaskCompletion::abandoned(&DefaultClock))
        .await
        .expect("abandon");

    let pending = repository.list_pending().await.expect("list pending");

    assert_eq!(pending.iter().map(Task::id).collect::<Vec<_>>(), vec![open.id()]);
}

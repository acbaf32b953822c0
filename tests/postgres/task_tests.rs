//! Task persistence and compare-and-set completion against `PostgreSQL`.

use std::time::Duration;

use mockable::DefaultClock;
use parley::task::{
    adapters::postgres::PostgresTaskRepository,
    domain::{Task, TaskCompletion, TaskRequest, TaskState},
    ports::{TaskRepository, TaskTransition},
};
use parley::thread::domain::ParticipantId;
use rstest::rstest;

use super::helpers::database;

fn approval() -> Result<Task, eyre::Report> {
    let request = TaskRequest::new("Approve refund", ParticipantId::new("u1")?)
        .with_actions(["approve", "reject"])
        .with_timeout(Duration::from_secs(3600));
    Ok(Task::new(request, &DefaultClock)?)
}

#[rstest]
#[tokio::test]
async fn stored_task_round_trips() -> Result<(), eyre::Report> {
    let db = database()?;
    let repository = PostgresTaskRepository::new(db.pool()?);
    let task = approval()?;

    repository.store(&task).await?;
    let found = repository
        .find_by_id(task.id())
        .await?
        .ok_or_else(|| eyre::eyre!("stored task not found"))?;

    assert_eq!(found.allowed_actions(), task.allowed_actions());
    assert_eq!(found.state(), TaskState::Pending);
    assert_eq!(
        found.deadline().map(|deadline| deadline.timestamp()),
        task.deadline().map(|deadline| deadline.timestamp())
    );
    Ok(())
}

#[rstest]
#[tokio::test]
async fn only_the_first_completion_applies() -> Result<(), eyre::Report> {
    let db = database()?;
    let repository = PostgresTaskRepository::new(db.pool()?);
    let task = approval()?;
    repository.store(&task).await?;

    let first = repository
        .complete(
            task.id(),
            TaskCompletion::by_action("approve", Some("looks good".to_owned()), &DefaultClock),
        )
        .await?;
    let second = repository
        .complete(task.id(), TaskCompletion::by_timeout(&DefaultClock))
        .await?;
    let pending = repository.list_pending().await?;

    assert!(matches!(first, TaskTransition::Applied(ref t) if t.state() == TaskState::CompletedByAction));
    assert!(matches!(second, TaskTransition::AlreadyTerminal(ref t) if t.state() == TaskState::CompletedByAction));
    assert!(pending.is_empty());
    Ok(())
}

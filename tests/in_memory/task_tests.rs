//! Human-in-the-loop tasks started from a running workflow.

use parley::delivery::{
    domain::InboundEvent,
    services::{HandlerContext, HandlerError, handler_fn},
};
use parley::task::{
    domain::{TaskHandle, TaskRequest},
    services::TaskCoordinatorError,
};
use parley::tenancy::domain::WorkflowType;
use rstest::rstest;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::test_helpers::{TENANT, caller, engine};

#[rstest]
#[tokio::test]
async fn handler_started_task_resumes_after_action() -> Result<(), eyre::Report> {
    let engine = engine().await?;
    let (started_tx, mut started_rx) = mpsc::unbounded_channel::<TaskHandle>();
    let coordinator = engine.coordinator.clone();
    engine.router.register_handler(
        WorkflowType::parse("Support:Conversational")?,
        handler_fn(move |handler: HandlerContext| {
            let coordinator = coordinator.clone();
            let started = started_tx.clone();
            async move {
                let participant = handler.thread().key().participant_id().clone();
                let request = TaskRequest::new("Confirm address", participant)
                    .with_actions(["confirm", "change"]);
                let (task, _) = coordinator
                    .create_with_notification(
                        handler.router(),
                        handler.workflow(),
                        request,
                        "Is your address still correct?",
                    )
                    .await
                    .map_err(|err| HandlerError::failed(err.to_string()))?;
                started
                    .send(task)
                    .map_err(|err| HandlerError::failed(err.to_string()))?;
                Ok::<_, HandlerError>(())
            }
        }),
    )?;

    engine
        .router
        .dispatch(
            &caller(TENANT)?,
            InboundEvent::chat(TENANT, "Support:Conversational", "u1", "I moved"),
        )
        .await?;
    let task = started_rx
        .recv()
        .await
        .ok_or_else(|| eyre::eyre!("handler did not start a task"))?;

    let waiter = {
        let coordinator = engine.coordinator.clone();
        tokio::spawn(async move { coordinator.await_result(task, &CancellationToken::new()).await })
    };
    engine
        .coordinator
        .perform_action(task.task_id(), "confirm", None)
        .await?;
    let result = waiter.await??;

    assert_eq!(result.performed_action.as_deref(), Some("confirm"));
    assert!(!result.timed_out);
    assert_eq!(
        engine.transport.delivered_texts()?,
        ["Is your address still correct?"]
    );
    Ok(())
}

#[rstest]
#[tokio::test]
async fn workflow_cancellation_stops_waiting() -> Result<(), eyre::Report> {
    let engine = engine().await?;
    let task = engine
        .coordinator
        .start(TaskRequest::new(
            "Review draft",
            parley::thread::domain::ParticipantId::new("u1")?,
        ))
        .await?;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = engine.coordinator.await_result(task, &cancel).await;

    assert!(matches!(result, Err(TaskCoordinatorError::Cancelled(_))));
    assert!(engine.coordinator.exists(task.task_id()).await?);
    Ok(())
}

//! Given steps for conversation routing BDD scenarios.

use eyre::WrapErr;
use parley::delivery::services::{HandlerContext, HandlerError, handler_fn};
use parley::task::domain::TaskRequest;
use parley::tenancy::domain::WorkflowType;
use parley::thread::domain::ParticipantId;
use rstest_bdd_macros::given;
use tokio_util::sync::CancellationToken;

use super::world::{RoutingWorld, run_async};
use crate::test_helpers::{context, engine};

#[given("the Support agent is registered")]
fn support_agent_registered(world: &mut RoutingWorld) -> Result<(), eyre::Report> {
    world.engine = Some(run_async(engine()).wrap_err("build in-memory engine")?);
    Ok(())
}

#[given(r#"the "{workflow}" workflow replies "{reply}""#)]
fn workflow_replies(
    world: &mut RoutingWorld,
    workflow: String,
    reply: String,
) -> Result<(), eyre::Report> {
    let workflow_type = WorkflowType::parse(&format!("Support:{workflow}"))?;
    world.engine()?.router.register_handler(
        workflow_type,
        handler_fn(move |handler: HandlerContext| {
            let text = reply.clone();
            async move {
                handler.reply(text, None).await?;
                Ok::<_, HandlerError>(())
            }
        }),
    )?;
    Ok(())
}

#[given(r#"an approval task announced to participant "{participant}" by "{workflow}""#)]
fn approval_task_announced(
    world: &mut RoutingWorld,
    participant: String,
    workflow: String,
) -> Result<(), eyre::Report> {
    let engine = world.engine()?;
    let request = TaskRequest::new("Approve refund", ParticipantId::new(participant)?)
        .with_actions(["approve", "reject"]);
    let (handle, message) = run_async(engine.coordinator.create_with_notification(
        &engine.router,
        &context(&workflow)?,
        request,
        "Please review the refund for order 7",
    ))
    .wrap_err("create approval task")?;
    world.task = Some(handle);
    world.last_message = Some(message);
    Ok(())
}

#[given("the workflow is waiting for the task")]
fn workflow_waits(world: &mut RoutingWorld) -> Result<(), eyre::Report> {
    let handle = world.task()?;
    let coordinator = world.engine()?.coordinator.clone();
    world.waiter = Some(tokio::spawn(async move {
        coordinator
            .await_result(handle, &CancellationToken::new())
            .await
    }));
    Ok(())
}

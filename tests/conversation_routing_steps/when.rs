//! When steps for conversation routing BDD scenarios.

use eyre::WrapErr;
use parley::delivery::domain::InboundEvent;
use rstest_bdd_macros::when;

use super::world::{RoutingWorld, run_async};
use crate::test_helpers::{TENANT, caller, context};

#[when(r#"participant "{participant}" sends chat "{text}" to "{workflow}""#)]
fn participant_sends_chat(
    world: &mut RoutingWorld,
    participant: String,
    text: String,
    workflow: String,
) -> Result<(), eyre::Report> {
    let event = InboundEvent::chat(TENANT, format!("Support:{workflow}"), participant, text);
    let outcome = run_async(world.engine()?.router.dispatch(&caller(TENANT)?, event))
        .wrap_err("dispatch inbound chat")?;
    world.last_message = Some(outcome.receipt.message);
    Ok(())
}

#[when(r#"the task is performed with "{action}" and comment "{comment}""#)]
fn task_performed(
    world: &mut RoutingWorld,
    action: String,
    comment: String,
) -> Result<(), eyre::Report> {
    let handle = world.task()?;
    run_async(
        world
            .engine()?
            .coordinator
            .perform_action(handle.task_id(), &action, Some(comment)),
    )
    .wrap_err("perform task action")?;
    Ok(())
}

#[when(r#"the "{sender}" workflow sends "{text}" to "{participant}" as "{impersonated}""#)]
fn workflow_sends_as(
    world: &mut RoutingWorld,
    sender: String,
    text: String,
    participant: String,
    impersonated: String,
) -> Result<(), eyre::Report> {
    let message = run_async(world.engine()?.router.send_as_workflow(
        &context(&sender)?,
        &impersonated,
        &participant,
        text,
        None,
        None,
    ))
    .wrap_err("send as impersonated workflow")?;
    world.last_message = Some(message);
    Ok(())
}

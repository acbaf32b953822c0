//! Then steps for conversation routing BDD scenarios.

use eyre::WrapErr;
use parley::thread::domain::{Scope, Thread};
use rstest_bdd_macros::then;

use super::world::{RoutingWorld, run_async};
use crate::test_helpers::{Engine, TENANT, caller};

fn thread_of(engine: &Engine, participant: &str, workflow: &str) -> Result<Thread, eyre::Report> {
    run_async(engine.router.threads().resolve_or_create(
        &caller(TENANT)?,
        TENANT,
        &format!("Support:{workflow}"),
        participant,
    ))
    .wrap_err("resolve thread")
}

#[then(r#"the null-scope history of "{participant}" in "{workflow}" reads "{expected}""#)]
fn history_reads(
    world: &RoutingWorld,
    participant: String,
    workflow: String,
    expected: String,
) -> Result<(), eyre::Report> {
    let engine = world.engine()?;
    let thread = thread_of(engine, &participant, &workflow)?;
    let page = run_async(engine.router.index().history(thread.id(), &Scope::null(), 1, 10))
        .wrap_err("read history")?;

    let texts: Vec<&str> = page
        .messages
        .iter()
        .filter_map(|message| message.payload().text())
        .collect();
    let wanted: Vec<&str> = expected.split(", ").collect();
    if texts != wanted {
        return Err(eyre::eyre!("expected history {wanted:?}, found {texts:?}"));
    }
    Ok(())
}

#[then(r#"the last hint for "{participant}" in "{workflow}" is the task id"#)]
fn last_hint_is_task(
    world: &RoutingWorld,
    participant: String,
    workflow: String,
) -> Result<(), eyre::Report> {
    let engine = world.engine()?;
    let thread = thread_of(engine, &participant, &workflow)?;
    let hint = run_async(engine.router.hints().get_last_hint(thread.id(), &Scope::null()))
        .wrap_err("read last hint")?;

    let expected = world.task()?.task_id().to_string();
    if hint.as_deref() != Some(expected.as_str()) {
        return Err(eyre::eyre!("expected hint {expected}, found {hint:?}"));
    }
    Ok(())
}

#[then(r#"the awaited result is "{action}" with comment "{comment}" and no timeout"#)]
fn awaited_result_is(
    world: &mut RoutingWorld,
    action: String,
    comment: String,
) -> Result<(), eyre::Report> {
    let waiter = world
        .waiter
        .take()
        .ok_or_else(|| eyre::eyre!("missing task waiter in scenario world"))?;
    let result = run_async(waiter)
        .wrap_err("join task waiter")?
        .wrap_err("await task result")?;

    if result.performed_action.as_deref() != Some(action.as_str())
        || result.comment.as_deref() != Some(comment.as_str())
        || result.timed_out
    {
        return Err(eyre::eyre!("unexpected task result {result:?}"));
    }
    Ok(())
}

#[then(r#"the message is in the thread of "{participant}" in "{workflow}""#)]
fn message_in_thread(
    world: &RoutingWorld,
    participant: String,
    workflow: String,
) -> Result<(), eyre::Report> {
    let thread = thread_of(world.engine()?, &participant, &workflow)?;
    let message = world.last_message()?;
    if message.thread_id() != thread.id() {
        return Err(eyre::eyre!(
            "message landed in thread {}, expected {}",
            message.thread_id(),
            thread.id()
        ));
    }
    Ok(())
}

#[then(r#"the message is not in the thread of "{participant}" in "{workflow}""#)]
fn message_not_in_thread(
    world: &RoutingWorld,
    participant: String,
    workflow: String,
) -> Result<(), eyre::Report> {
    let thread = thread_of(world.engine()?, &participant, &workflow)?;
    if world.last_message()?.thread_id() == thread.id() {
        return Err(eyre::eyre!("message landed in the sender's own thread"));
    }
    Ok(())
}

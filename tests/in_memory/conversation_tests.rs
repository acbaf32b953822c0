//! Thread resolution, scope isolation and history paging across the engine.

use parley::delivery::error::DeliveryError;
use parley::thread::{domain::Scope, services::ThreadRegistryError};
use rstest::rstest;
use tokio::task::JoinSet;

use crate::test_helpers::{TENANT, caller, context, engine};

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_calls_share_one_thread() -> Result<(), eyre::Report> {
    let engine = engine().await?;
    let mut calls = JoinSet::new();
    for _ in 0..16 {
        let threads = engine.router.threads().clone();
        let identity = caller(TENANT)?;
        calls.spawn(async move {
            threads
                .resolve_or_create(&identity, TENANT, "Support:Conversational", "u1")
                .await
        });
    }

    let mut ids = Vec::new();
    while let Some(joined) = calls.join_next().await {
        ids.push(joined??.id());
    }
    ids.dedup();

    assert_eq!(ids.len(), 1);
    Ok(())
}

#[rstest]
#[tokio::test]
async fn scopes_partition_one_thread() -> Result<(), eyre::Report> {
    let engine = engine().await?;
    let ctx = context("Conversational")?;
    let order = Scope::named("order-7")?;
    engine
        .router
        .send_proactive(&ctx, "u1", "general news", None, None)
        .await?;
    engine
        .router
        .send_proactive(&ctx, "u1", "order shipped", None, Some(order.clone()))
        .await?;

    let thread = engine
        .router
        .threads()
        .resolve_or_create(&caller(TENANT)?, TENANT, "Support:Conversational", "u1")
        .await?;
    let null_page = engine.router.index().latest(thread.id(), &Scope::null()).await?;
    let order_page = engine.router.index().latest(thread.id(), &order).await?;

    let texts = |page: &parley::message::domain::HistoryPage| -> Vec<String> {
        page.messages
            .iter()
            .filter_map(|message| message.payload().text().map(str::to_owned))
            .collect()
    };
    assert_eq!(texts(&null_page), ["general news"]);
    assert_eq!(texts(&order_page), ["order shipped"]);
    Ok(())
}

#[rstest]
#[tokio::test]
async fn history_pages_newest_first() -> Result<(), eyre::Report> {
    let engine = engine().await?;
    let ctx = context("Conversational")?;
    for n in 1..=25 {
        engine
            .router
            .send_proactive(&ctx, "u1", format!("m{n}"), None, None)
            .await?;
    }
    let thread = engine
        .router
        .threads()
        .resolve_or_create(&caller(TENANT)?, TENANT, "Support:Conversational", "u1")
        .await?;

    let first = engine.router.index().history(thread.id(), &Scope::null(), 1, 10).await?;
    let last = engine.router.index().history(thread.id(), &Scope::null(), 3, 10).await?;

    assert_eq!(
        first.messages.first().and_then(|message| message.payload().text()),
        Some("m25")
    );
    assert!(first.has_more);
    assert_eq!(last.messages.len(), 5);
    assert_eq!(
        last.messages.last().and_then(|message| message.payload().text()),
        Some("m1")
    );
    assert!(!last.has_more);
    Ok(())
}

#[rstest]
#[tokio::test]
async fn foreign_tenant_cannot_resolve_threads() -> Result<(), eyre::Report> {
    let engine = engine().await?;

    let result = engine
        .router
        .threads()
        .resolve_or_create(&caller("globex")?, TENANT, "Support:Conversational", "u1")
        .await;

    assert!(matches!(result, Err(ThreadRegistryError::TenantMismatch { .. })));
    Ok(())
}

#[rstest]
#[tokio::test]
async fn unknown_workflow_is_rejected_on_send() -> Result<(), eyre::Report> {
    let engine = engine().await?;

    let result = engine
        .router
        .send_as_workflow(&context("Nightly")?, "Billing", "u1", "hello", None, None)
        .await;

    assert!(matches!(result, Err(DeliveryError::WorkflowNotFound(_))));
    Ok(())
}

//! Thread uniqueness against `PostgreSQL`.

use rstest::rstest;
use tokio::task::JoinSet;

use super::helpers::{caller, database, thread_registry};

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_resolution_creates_one_row() -> Result<(), eyre::Report> {
    let db = database()?;
    let registry = thread_registry(db.pool()?).await?;

    let mut calls = JoinSet::new();
    for _ in 0..8 {
        let threads = registry.clone();
        let identity = caller("acme")?;
        calls.spawn(async move {
            threads
                .resolve_or_create(&identity, "acme", "Support:Conversational", "u1")
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
async fn distinct_participants_get_distinct_threads() -> Result<(), eyre::Report> {
    let db = database()?;
    let registry = thread_registry(db.pool()?).await?;
    let identity = caller("acme")?;

    let first = registry
        .resolve_or_create(&identity, "acme", "Support:Conversational", "u1")
        .await?;
    let second = registry
        .resolve_or_create(&identity, "acme", "Support:Conversational", "u2")
        .await?;
    let found = registry.get(first.id()).await?;

    assert_ne!(first.id(), second.id());
    assert_eq!(found.map(|thread| thread.id()), Some(first.id()));
    Ok(())
}

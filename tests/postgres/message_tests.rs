//! Message ledger behaviour against `PostgreSQL`.

use std::sync::Arc;

use parley::clock::system_clock;
use parley::config::HistoryConfig;
use parley::message::{
    adapters::postgres::PostgresMessageStore,
    domain::{MessageDraft, MessagePayload},
    services::{HintOverlay, ScopeIndex},
    validation::DefaultMessageValidator,
};
use parley::thread::domain::{Scope, Thread};
use rstest::rstest;

use super::helpers::{PgPool, caller, database, thread_registry};

struct Ledger {
    index: ScopeIndex,
    hints: HintOverlay,
    thread: Thread,
}

async fn ledger(pool: PgPool) -> Result<Ledger, eyre::Report> {
    let thread = thread_registry(pool.clone())
        .await?
        .resolve_or_create(&caller("acme")?, "acme", "Support:Conversational", "u1")
        .await?;
    let store = Arc::new(PostgresMessageStore::new(pool, system_clock()));
    Ok(Ledger {
        index: ScopeIndex::new(
            store.clone(),
            Arc::new(DefaultMessageValidator::new()),
            HistoryConfig::default(),
        ),
        hints: HintOverlay::new(store),
        thread,
    })
}

fn chat(thread: &Thread, text: &str) -> MessageDraft {
    MessageDraft::incoming(
        thread.key().participant_id().clone(),
        thread.key().workflow_type().clone(),
        MessagePayload::chat(text),
    )
}

#[rstest]
#[tokio::test]
async fn buckets_order_and_isolate_messages() -> Result<(), eyre::Report> {
    let db = database()?;
    let ledger = ledger(db.pool()?).await?;
    let order = Scope::named("order-7")?;
    for text in ["one", "two", "three"] {
        ledger
            .index
            .place(ledger.thread.id(), &Scope::null(), chat(&ledger.thread, text))
            .await?;
    }
    ledger
        .index
        .place(ledger.thread.id(), &order, chat(&ledger.thread, "scoped"))
        .await?;

    let null_page = ledger.index.history(ledger.thread.id(), &Scope::null(), 1, 2).await?;
    let order_page = ledger.index.latest(ledger.thread.id(), &order).await?;

    let texts: Vec<&str> = null_page
        .messages
        .iter()
        .filter_map(|message| message.payload().text())
        .collect();
    assert_eq!(texts, ["three", "two"]);
    assert!(null_page.has_more);
    assert_eq!(order_page.messages.len(), 1);
    assert_eq!(
        order_page
            .messages
            .first()
            .map(|message| message.sequence_number().value()),
        Some(1)
    );
    Ok(())
}

#[rstest]
#[tokio::test]
async fn hint_register_tracks_latest_hint() -> Result<(), eyre::Report> {
    let db = database()?;
    let ledger = ledger(db.pool()?).await?;
    let thread_id = ledger.thread.id();

    let empty = ledger.hints.get_last_hint(thread_id, &Scope::null()).await?;
    ledger
        .index
        .place(
            thread_id,
            &Scope::null(),
            chat(&ledger.thread, "with hint").with_hint(Some("task-1".to_owned())),
        )
        .await?;
    ledger
        .index
        .place(thread_id, &Scope::null(), chat(&ledger.thread, "no hint"))
        .await?;
    let after_messages = ledger.hints.get_last_hint(thread_id, &Scope::null()).await?;
    ledger.hints.set_hint(thread_id, &Scope::null(), "task-2").await?;
    let after_set = ledger.hints.get_last_hint(thread_id, &Scope::null()).await?;

    assert_eq!(empty, None);
    assert_eq!(after_messages.as_deref(), Some("task-1"));
    assert_eq!(after_set.as_deref(), Some("task-2"));
    Ok(())
}

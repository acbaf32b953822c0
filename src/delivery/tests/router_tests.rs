//! Unit tests for inbound routing and outbound sends.

use std::sync::Arc;

use super::fixtures::{
    Harness, bucket, caller, chat_event, conversational, harness, router_from, router_with,
    thread_of, workflow,
};
use crate::clock::system_clock;
use crate::config::{ConfigError, EngineConfig, HistoryConfig};
use crate::delivery::{
    adapters::memory::RecordingTransport, error::DeliveryError, ports::MockTransport,
    ports::TransportError, services::DeliveryRouter,
};
use crate::message::{
    adapters::memory::InMemoryMessageStore,
    domain::{Direction, MessageOrigin, MessagePayload},
    services::ScopeIndexError,
};
use crate::tenancy::{adapters::memory::InMemoryWorkflowRegistry, services::AgentRegistryService};
use crate::thread::{
    adapters::memory::InMemoryThreadRepository,
    domain::Scope,
    services::{ThreadRegistryError, ThreadRegistryService},
};
use rstest::rstest;
use serde_json::json;

fn scope(label: &str) -> Scope {
    Scope::named(label).expect("valid scope")
}

#[rstest]
#[tokio::test]
async fn inbound_then_reply_share_thread_and_bucket(#[future] harness: Harness) {
    let ctx = harness.await;
    let receipt = ctx
        .router
        .receive(&caller("acme"), chat_event("u1", "hello"))
        .await
        .expect("inbound stored");
    let reply = ctx
        .router
        .reply(&receipt.message, "hi there", None)
        .await
        .expect("reply delivered");

    assert_eq!(reply.thread_id(), receipt.thread.id());
    assert_eq!(reply.direction(), Direction::Outgoing);
    assert_eq!(reply.sequence_number().value(), 2);

    let stored = bucket(&ctx.router, "Support:Conversational", "u1", &Scope::null()).await;
    let texts: Vec<_> = stored.iter().filter_map(|m| m.payload().text()).collect();
    assert_eq!(texts, ["hello", "hi there"]);
    assert_eq!(ctx.transport.delivered_texts().expect("texts"), ["hi there"]);
}

#[rstest]
#[tokio::test]
async fn reply_stays_in_the_inbound_scope(#[future] harness: Harness) {
    let ctx = harness.await;
    let receipt = ctx
        .router
        .receive(
            &caller("acme"),
            chat_event("u1", "where is my order?").with_scope(scope("order-7")),
        )
        .await
        .expect("inbound stored");
    ctx.router
        .reply(&receipt.message, "on its way", Some(json!({"eta": "2d"})))
        .await
        .expect("reply delivered");

    let scoped = bucket(&ctx.router, "Support:Conversational", "u1", &scope("order-7")).await;
    let unscoped = bucket(&ctx.router, "Support:Conversational", "u1", &Scope::null()).await;
    assert_eq!(scoped.len(), 2);
    assert!(unscoped.is_empty());
}

#[rstest]
#[tokio::test]
async fn inbound_for_foreign_tenant_is_rejected(#[future] harness: Harness) {
    let ctx = harness.await;
    let err = ctx
        .router
        .receive(&caller("globex"), chat_event("u1", "hello"))
        .await
        .expect_err("tenant mismatch");

    assert!(matches!(
        err,
        DeliveryError::Thread(ThreadRegistryError::TenantMismatch { .. })
    ));
}

#[rstest]
#[tokio::test]
async fn inbound_with_blank_participant_is_invalid(#[future] harness: Harness) {
    let ctx = harness.await;
    let err = ctx
        .router
        .receive(&caller("acme"), chat_event("  ", "hello"))
        .await
        .expect_err("invalid key");

    assert!(matches!(
        err,
        DeliveryError::Thread(ThreadRegistryError::InvalidKey(_))
    ));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn transient_transport_failures_are_retried(#[future] harness: Harness) {
    let ctx = harness.await;
    ctx.transport.fail_next(2).expect("configure failures");
    let receipt = ctx
        .router
        .receive(&caller("acme"), chat_event("u1", "hello"))
        .await
        .expect("inbound stored");

    ctx.router
        .reply(&receipt.message, "eventually", None)
        .await
        .expect("delivered on third attempt");

    assert_eq!(ctx.transport.attempts().expect("attempts"), 3);
    assert_eq!(ctx.transport.delivered_texts().expect("texts"), ["eventually"]);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn exhausted_retries_keep_the_stored_message(#[future] harness: Harness) {
    let ctx = harness.await;
    ctx.transport.fail_next(10).expect("configure failures");
    let receipt = ctx
        .router
        .receive(&caller("acme"), chat_event("u1", "hello"))
        .await
        .expect("inbound stored");

    let err = ctx
        .router
        .reply(&receipt.message, "lost in transit", None)
        .await
        .expect_err("transmission fails");

    let DeliveryError::Transmission { message_id, .. } = err else {
        panic!("expected transmission error, got {err:?}");
    };
    let stored = ctx.router.index().get(message_id).await.expect("lookup");
    assert!(stored.is_some());
    assert_eq!(ctx.transport.attempts().expect("attempts"), 3);
}

#[tokio::test]
async fn rejected_transmission_is_not_retried() {
    let mut transport = MockTransport::new();
    transport
        .expect_transmit()
        .times(1)
        .returning(|_| Err(TransportError::Rejected("blocked recipient".to_owned())));
    let router = router_with(Arc::new(transport)).await;

    let err = router
        .send_proactive(&conversational(), "u1", "ping", None, None)
        .await
        .expect_err("rejected");

    assert!(matches!(err, DeliveryError::Transmission { .. }));
}

#[rstest]
#[tokio::test]
async fn proactive_send_creates_thread_in_null_scope(#[future] harness: Harness) {
    let ctx = harness.await;
    let sent = ctx
        .router
        .send_proactive(&conversational(), "newcomer", "welcome!", None, None)
        .await
        .expect("proactive send");

    assert!(sent.scope().is_null());
    assert_eq!(sent.origin(), &MessageOrigin::Workflow {
        workflow_type: workflow("Support:Conversational")
    });
    let thread = thread_of(&ctx.router, "Support:Conversational", "newcomer").await;
    assert_eq!(sent.thread_id(), thread.id());
}

#[rstest]
#[tokio::test]
async fn send_as_workflow_lands_in_impersonated_thread(#[future] harness: Harness) {
    let ctx = harness.await;
    let sent = ctx
        .router
        .send_as_workflow(
            &conversational(),
            "Notifications",
            "u1",
            "your invoice is ready",
            None,
            Some(scope("billing")),
        )
        .await
        .expect("impersonated send");

    let target = thread_of(&ctx.router, "Support:Notifications", "u1").await;
    assert_eq!(sent.thread_id(), target.id());
    assert_eq!(sent.workflow_type(), &workflow("Support:Notifications"));
    assert_eq!(sent.origin(), &MessageOrigin::Workflow {
        workflow_type: workflow("Support:Conversational")
    });
    let own = bucket(&ctx.router, "Support:Conversational", "u1", &scope("billing")).await;
    assert!(own.is_empty());
}

#[rstest]
#[case("Missing")]
#[case("Survey")]
#[tokio::test]
async fn send_as_workflow_requires_builtin_definition(
    #[future] harness: Harness,
    #[case] name: &str,
) {
    let ctx = harness.await;
    let err = ctx
        .router
        .send_as_workflow(&conversational(), name, "u1", "hi", None, None)
        .await
        .expect_err("not a built-in workflow");

    assert!(matches!(err, DeliveryError::WorkflowNotFound(_)));
}

#[rstest]
#[tokio::test]
async fn handoff_is_recorded_in_the_source_bucket(#[future] harness: Harness) {
    let ctx = harness.await;
    let receipt = ctx
        .router
        .receive(&caller("acme"), chat_event("u1", "I need a human"))
        .await
        .expect("inbound stored");

    let handoff = ctx
        .router
        .send_handoff(
            &receipt.message,
            &workflow("Support:Escalation"),
            "transferring you",
            None,
        )
        .await
        .expect("handoff");

    let MessagePayload::Handoff(payload) = handoff.payload() else {
        panic!("expected handoff payload");
    };
    assert_eq!(payload.target_workflow, workflow("Support:Escalation"));
    assert_eq!(handoff.thread_id(), receipt.thread.id());
    assert_eq!(ctx.transport.delivered().expect("delivered").len(), 1);
}

#[rstest]
#[tokio::test]
async fn handoff_to_invisible_workflow_is_rejected(#[future] harness: Harness) {
    let ctx = harness.await;
    let receipt = ctx
        .router
        .receive(&caller("acme"), chat_event("u1", "pay my bill"))
        .await
        .expect("inbound stored");

    let err = ctx
        .router
        .send_handoff(&receipt.message, &workflow("Billing:Invoices"), "see billing", None)
        .await
        .expect_err("foreign workflow");

    assert!(matches!(err, DeliveryError::WorkflowNotFound(_)));
    assert!(ctx.transport.delivered().expect("delivered").is_empty());
}

#[tokio::test]
async fn configured_text_limit_rejects_long_chat() {
    let engine = EngineConfig::from_toml_str("[validation]\nmax_text_length = 10\n")
        .expect("valid configuration");
    let router = router_from(Arc::new(RecordingTransport::new()), engine).await;

    let long = router
        .receive(&caller("acme"), chat_event("u1", "well over ten characters"))
        .await;
    let short = router
        .receive(&caller("acme"), chat_event("u1", "short"))
        .await;

    assert!(matches!(
        long,
        Err(DeliveryError::Index(ScopeIndexError::Validation(_)))
    ));
    assert!(short.is_ok());
    assert_eq!(router.config().validation.max_text_length, 10);
}

#[test]
fn assembly_rejects_invalid_configuration() {
    let clock = system_clock();
    let workflows = Arc::new(InMemoryWorkflowRegistry::new());
    let agents = AgentRegistryService::new(workflows.clone(), clock.clone());
    let threads =
        ThreadRegistryService::new(Arc::new(InMemoryThreadRepository::new()), workflows, clock.clone());
    let engine = EngineConfig::default().with_history(HistoryConfig {
        default_page_size: 0,
        max_page_size: 10,
    });

    let result = DeliveryRouter::from_config(
        threads,
        agents,
        Arc::new(InMemoryMessageStore::new(clock)),
        Arc::new(RecordingTransport::new()),
        engine,
    );

    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

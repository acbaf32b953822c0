//! Shared fixtures for delivery tests.

use std::sync::Arc;

use crate::clock::system_clock;
use crate::config::{A2aConfig, EngineConfig, RetryPolicy};
use crate::delivery::{
    adapters::memory::RecordingTransport,
    domain::{InboundEvent, WorkflowContext},
    ports::Transport,
    services::DeliveryRouter,
};
use crate::message::{adapters::memory::InMemoryMessageStore, domain::Message};
use crate::tenancy::{
    adapters::memory::InMemoryWorkflowRegistry,
    domain::{CallerIdentity, TenantId, WorkflowType},
    services::{AgentRegistryService, RegisterAgentRequest},
};
use crate::thread::{
    adapters::memory::InMemoryThreadRepository,
    domain::{Scope, Thread},
    services::ThreadRegistryService,
};
use rstest::fixture;

pub const FALLBACK: &str = "Sorry, something went wrong.";

pub struct Harness {
    pub router: DeliveryRouter,
    pub transport: RecordingTransport,
}

pub fn config() -> EngineConfig {
    EngineConfig::default()
        .with_retry(RetryPolicy {
            max_attempts: 3,
            initial_backoff_ms: 10,
            max_backoff_ms: 40,
        })
        .with_a2a(A2aConfig {
            reply_timeout_ms: 500,
        })
        .with_fallback_reply(FALLBACK)
}

pub async fn router_with(transport: Arc<dyn Transport>) -> DeliveryRouter {
    router_from(transport, config()).await
}

pub async fn router_from(transport: Arc<dyn Transport>, engine: EngineConfig) -> DeliveryRouter {
    let clock = system_clock();
    let workflows = Arc::new(InMemoryWorkflowRegistry::new());
    let agents = AgentRegistryService::new(workflows.clone(), clock.clone());
    agents
        .register(
            RegisterAgentRequest::for_tenant("acme", "Support", "1.0.0")
                .with_built_in("Conversational")
                .with_built_in("Notifications")
                .with_built_in("Escalation")
                .with_custom("Survey"),
        )
        .await
        .expect("support agent registration");
    agents
        .register(
            RegisterAgentRequest::for_tenant("globex", "Billing", "1.0.0")
                .with_built_in("Invoices"),
        )
        .await
        .expect("billing agent registration");

    let threads = ThreadRegistryService::new(
        Arc::new(InMemoryThreadRepository::new()),
        workflows,
        clock.clone(),
    );
    DeliveryRouter::from_config(
        threads,
        agents,
        Arc::new(InMemoryMessageStore::new(clock)),
        transport,
        engine,
    )
    .expect("valid engine configuration")
}

#[fixture]
pub async fn harness() -> Harness {
    let transport = RecordingTransport::new();
    Harness {
        router: router_with(Arc::new(transport.clone())).await,
        transport,
    }
}

pub fn caller(tenant: &str) -> CallerIdentity {
    CallerIdentity::new(TenantId::new(tenant).expect("valid tenant"))
}

pub fn workflow(value: &str) -> WorkflowType {
    WorkflowType::parse(value).expect("valid workflow type")
}

pub fn conversational() -> WorkflowContext {
    WorkflowContext::new(caller("acme"), workflow("Support:Conversational"))
}

pub fn chat_event(participant: &str, text: &str) -> InboundEvent {
    InboundEvent::chat("acme", "Support:Conversational", participant, text)
}

pub async fn thread_of(router: &DeliveryRouter, workflow_type: &str, participant: &str) -> Thread {
    router
        .threads()
        .resolve_or_create(&caller("acme"), "acme", workflow_type, participant)
        .await
        .expect("thread resolution")
}

/// Returns the bucket's messages oldest first.
pub async fn bucket(
    router: &DeliveryRouter,
    workflow_type: &str,
    participant: &str,
    scope: &Scope,
) -> Vec<Message> {
    let thread = thread_of(router, workflow_type, participant).await;
    let page = router
        .index()
        .history(thread.id(), scope, 1, 50)
        .await
        .expect("history");
    page.messages.into_iter().rev().collect()
}

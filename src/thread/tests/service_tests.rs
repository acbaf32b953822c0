//! Unit tests for the thread registry service.

use std::collections::HashSet;
use std::sync::Arc;

use crate::clock::system_clock;
use crate::tenancy::{
    adapters::memory::InMemoryWorkflowRegistry,
    domain::{CallerIdentity, TenantId},
    services::{AgentRegistryService, RegisterAgentRequest},
};
use crate::thread::{
    adapters::memory::InMemoryThreadRepository,
    services::{ThreadRegistryError, ThreadRegistryService},
};
use rstest::{fixture, rstest};

struct Harness {
    registry: ThreadRegistryService,
    threads: InMemoryThreadRepository,
}

#[fixture]
async fn harness() -> Harness {
    let workflows = Arc::new(InMemoryWorkflowRegistry::new());
    AgentRegistryService::new(workflows.clone(), system_clock())
        .register(
            RegisterAgentRequest::for_tenant("acme", "Support", "1.0.0")
                .with_built_in("Conversational"),
        )
        .await
        .expect("agent registration");

    let threads = InMemoryThreadRepository::new();
    Harness {
        registry: ThreadRegistryService::new(Arc::new(threads.clone()), workflows, system_clock()),
        threads,
    }
}

fn caller(tenant: &str) -> CallerIdentity {
    CallerIdentity::new(TenantId::new(tenant).expect("valid tenant"))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn repeated_resolution_returns_same_thread(#[future] harness: Harness) {
    let ctx = harness.await;
    let first = ctx
        .registry
        .resolve_or_create(&caller("acme"), "acme", "Support:Conversational", "u1")
        .await
        .expect("first resolution");
    let second = ctx
        .registry
        .resolve_or_create(&caller("acme"), "acme", "Support:Conversational", "u1")
        .await
        .expect("second resolution");

    assert_eq!(first.id(), second.id());
    assert_eq!(ctx.threads.len().expect("count"), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn different_participants_get_different_threads(#[future] harness: Harness) {
    let ctx = harness.await;
    let u1 = ctx
        .registry
        .resolve_or_create(&caller("acme"), "acme", "Support:Conversational", "u1")
        .await
        .expect("u1");
    let u2 = ctx
        .registry
        .resolve_or_create(&caller("acme"), "acme", "Support:Conversational", "u2")
        .await
        .expect("u2");

    assert_ne!(u1.id(), u2.id());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_first_calls_converge(#[future] harness: Harness) {
    let ctx = harness.await;
    let mut tasks = Vec::new();
    for _ in 0..16 {
        let registry = ctx.registry.clone();
        tasks.push(tokio::spawn(async move {
            registry
                .resolve_or_create(&caller("acme"), "acme", "Support:Conversational", "racer")
                .await
                .map(|thread| thread.id())
        }));
    }

    let mut ids = HashSet::new();
    for task in tasks {
        ids.insert(task.await.expect("join").expect("resolution"));
    }
    assert_eq!(ids.len(), 1);
    assert_eq!(ctx.threads.len().expect("count"), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn empty_participant_is_invalid_key(#[future] harness: Harness) {
    let ctx = harness.await;
    let result = ctx
        .registry
        .resolve_or_create(&caller("acme"), "acme", "Support:Conversational", " ")
        .await;
    assert!(matches!(result, Err(ThreadRegistryError::InvalidKey(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn foreign_tenant_is_rejected(#[future] harness: Harness) {
    let ctx = harness.await;
    let result = ctx
        .registry
        .resolve_or_create(&caller("globex"), "acme", "Support:Conversational", "u1")
        .await;
    assert!(matches!(result, Err(ThreadRegistryError::TenantMismatch { .. })));
    assert!(ctx.threads.is_empty().expect("count"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_workflow_is_rejected(#[future] harness: Harness) {
    let ctx = harness.await;
    let result = ctx
        .registry
        .resolve_or_create(&caller("acme"), "acme", "Support:Missing", "u1")
        .await;
    assert!(matches!(result, Err(ThreadRegistryError::WorkflowNotFound(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn get_for_hides_threads_of_other_tenants(#[future] harness: Harness) {
    let ctx = harness.await;
    let thread = ctx
        .registry
        .resolve_or_create(&caller("acme"), "acme", "Support:Conversational", "u1")
        .await
        .expect("resolution");

    let own = ctx
        .registry
        .get_for(&caller("acme"), thread.id())
        .await
        .expect("lookup");
    assert_eq!(own, Some(thread.clone()));

    let foreign = ctx.registry.get_for(&caller("globex"), thread.id()).await;
    assert!(matches!(foreign, Err(ThreadRegistryError::TenantMismatch { .. })));
}

//! In-memory engine wiring shared by integration tests.

use std::sync::Arc;

use parley::clock::system_clock;
use parley::config::{A2aConfig, EngineConfig};
use parley::delivery::{
    adapters::memory::RecordingTransport,
    domain::WorkflowContext,
    services::{AdminMessagingService, DeliveryRouter, WebhookService},
};
use parley::message::adapters::memory::InMemoryMessageStore;
use parley::task::{adapters::memory::InMemoryTaskRepository, services::TaskCoordinator};
use parley::tenancy::{
    adapters::memory::InMemoryWorkflowRegistry,
    domain::{CallerIdentity, TenantId, WorkflowType},
    services::{AgentRegistryService, RegisterAgentRequest},
};
use parley::thread::{adapters::memory::InMemoryThreadRepository, services::ThreadRegistryService};

/// Tenant every helper registers its agent under.
pub const TENANT: &str = "acme";

/// Fully wired in-memory engine.
pub struct Engine {
    pub router: DeliveryRouter,
    pub transport: RecordingTransport,
    pub coordinator: TaskCoordinator,
    pub webhooks: WebhookService,
    pub admin: AdminMessagingService,
}

/// Builds an engine with a `Support` agent owning the `Conversational`,
/// `Nightly` and `Orders` built-in workflows.
///
/// # Errors
///
/// Returns an error when agent registration fails.
pub async fn engine() -> Result<Engine, eyre::Report> {
    let clock = system_clock();
    let config = EngineConfig::default().with_a2a(A2aConfig {
        reply_timeout_ms: 1_000,
    });
    let workflows = Arc::new(InMemoryWorkflowRegistry::new());
    let agents = AgentRegistryService::new(workflows.clone(), clock.clone());
    agents
        .register(
            RegisterAgentRequest::for_tenant(TENANT, "Support", "1.0.0")
                .with_built_in("Conversational")
                .with_built_in("Nightly")
                .with_built_in("Orders"),
        )
        .await?;

    let threads = ThreadRegistryService::new(
        Arc::new(InMemoryThreadRepository::new()),
        workflows,
        clock.clone(),
    );
    let transport = RecordingTransport::new();
    let router = DeliveryRouter::from_config(
        threads,
        agents,
        Arc::new(InMemoryMessageStore::new(clock.clone())),
        Arc::new(transport.clone()),
        config,
    )?;

    Ok(Engine {
        coordinator: TaskCoordinator::new(Arc::new(InMemoryTaskRepository::new()), clock),
        webhooks: WebhookService::from_router(router.clone()),
        admin: AdminMessagingService::new(router.clone()),
        router,
        transport,
    })
}

/// Returns a caller authenticated as `tenant`.
///
/// # Errors
///
/// Returns an error for a blank tenant.
pub fn caller(tenant: &str) -> Result<CallerIdentity, eyre::Report> {
    Ok(CallerIdentity::new(TenantId::new(tenant)?))
}

/// Returns the context of a `Support` workflow acting for [`TENANT`].
///
/// # Errors
///
/// Returns an error for an unknown workflow name.
pub fn context(workflow_name: &str) -> Result<WorkflowContext, eyre::Report> {
    Ok(WorkflowContext::new(
        caller(TENANT)?,
        WorkflowType::parse(&format!("Support:{workflow_name}"))?,
    ))
}

//! Registry port for agents and their workflows.

use crate::tenancy::domain::{
    AgentName, AgentOwner, AgentRegistration, RegisteredWorkflow, TenantId, WorkflowType,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for workflow registry operations.
pub type WorkflowRegistryResult<T> = Result<T, WorkflowRegistryError>;

/// Process-wide table of registered agents and workflows.
///
/// Lookups are always tenant-relative: an agent owned by another tenant is
/// invisible, and a tenant-owned agent shadows a template of the same name.
#[async_trait]
pub trait WorkflowRegistry: Send + Sync {
    /// Registers an agent with its workflows.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowRegistryError::DuplicateAgent`] when the owner has
    /// already registered an agent with the same name.
    async fn register(&self, registration: &AgentRegistration) -> WorkflowRegistryResult<()>;

    /// Finds the agent named `name` as seen by `tenant_id`.
    async fn find_agent(
        &self,
        tenant_id: &TenantId,
        name: &AgentName,
    ) -> WorkflowRegistryResult<Option<AgentRegistration>>;

    /// Finds a workflow by fully qualified type as seen by `tenant_id`.
    async fn find_workflow(
        &self,
        tenant_id: &TenantId,
        workflow_type: &WorkflowType,
    ) -> WorkflowRegistryResult<Option<RegisteredWorkflow>>;

    /// Lists every agent visible to `tenant_id`, ordered by name.
    async fn list_agents(&self, tenant_id: &TenantId)
    -> WorkflowRegistryResult<Vec<AgentRegistration>>;
}

/// Errors returned by workflow registry implementations.
#[derive(Debug, Clone, Error)]
pub enum WorkflowRegistryError {
    /// The owner already registered an agent with this name.
    #[error("agent '{name}' is already registered for {owner:?}")]
    DuplicateAgent {
        /// Owner of the existing registration.
        owner: AgentOwner,
        /// Name of the agent.
        name: AgentName,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl WorkflowRegistryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

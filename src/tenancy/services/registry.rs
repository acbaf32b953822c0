//! Service layer for agent registration and workflow resolution.

use crate::clock::SharedClock;
use crate::tenancy::{
    domain::{
        AgentName, AgentOwner, AgentRegistration, RegisteredWorkflow, TenancyDomainError,
        TenantId, WorkflowDefinition, WorkflowKind, WorkflowName, WorkflowType,
    },
    ports::{WorkflowRegistry, WorkflowRegistryError},
};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Request payload for registering an agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterAgentRequest {
    name: String,
    version: String,
    tenant_id: Option<String>,
    workflows: Vec<(String, WorkflowKind)>,
}

impl RegisterAgentRequest {
    /// Creates a request for an agent owned by `tenant_id`.
    #[must_use]
    pub fn for_tenant(
        tenant_id: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            tenant_id: Some(tenant_id.into()),
            workflows: Vec::new(),
        }
    }

    /// Creates a request for a cross-tenant template agent.
    #[must_use]
    pub fn template(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            tenant_id: None,
            workflows: Vec::new(),
        }
    }

    /// Declares a built-in workflow.
    #[must_use]
    pub fn with_built_in(mut self, name: impl Into<String>) -> Self {
        self.workflows.push((name.into(), WorkflowKind::BuiltIn));
        self
    }

    /// Declares a custom workflow.
    #[must_use]
    pub fn with_custom(mut self, name: impl Into<String>) -> Self {
        self.workflows.push((name.into(), WorkflowKind::Custom));
        self
    }
}

/// Service-level errors for registry operations.
#[derive(Debug, Error)]
pub enum AgentRegistryServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TenancyDomainError),

    /// Registry operation failed.
    #[error(transparent)]
    Registry(#[from] WorkflowRegistryError),

    /// No visible workflow matches the requested type or name.
    #[error("workflow not found: {0}")]
    WorkflowNotFound(String),

    /// More than one workflow of the agent matches the requested name.
    #[error("workflow name '{name}' is ambiguous for agent '{agent}'")]
    AmbiguousWorkflow {
        /// Agent whose workflows were searched.
        agent: AgentName,
        /// The requested short name.
        name: String,
    },
}

/// Result type for registry service operations.
pub type AgentRegistryServiceResult<T> = Result<T, AgentRegistryServiceError>;

/// Registration and resolution of agents and workflows.
#[derive(Clone)]
pub struct AgentRegistryService {
    registry: Arc<dyn WorkflowRegistry>,
    clock: SharedClock,
}

impl AgentRegistryService {
    /// Creates a new registry service.
    #[must_use]
    pub fn new(registry: Arc<dyn WorkflowRegistry>, clock: SharedClock) -> Self {
        Self { registry, clock }
    }

    /// Returns the underlying registry handle.
    #[must_use]
    pub fn registry(&self) -> Arc<dyn WorkflowRegistry> {
        Arc::clone(&self.registry)
    }

    /// Registers an agent and its workflows.
    ///
    /// # Errors
    ///
    /// Returns [`AgentRegistryServiceError::Domain`] for invalid names and
    /// [`AgentRegistryServiceError::Registry`] when the registry rejects the
    /// registration.
    pub async fn register(
        &self,
        request: RegisterAgentRequest,
    ) -> AgentRegistryServiceResult<AgentRegistration> {
        let RegisterAgentRequest {
            name,
            version,
            tenant_id,
            workflows,
        } = request;

        let agent_name = AgentName::new(name)?;
        let owner = match tenant_id {
            Some(raw) => AgentOwner::Tenant {
                tenant_id: TenantId::new(raw)?,
            },
            None => AgentOwner::Template,
        };
        let definitions = workflows
            .into_iter()
            .map(|(workflow, kind)| {
                let workflow_name = WorkflowName::new(workflow)?;
                Ok(match kind {
                    WorkflowKind::BuiltIn => WorkflowDefinition::built_in(workflow_name),
                    WorkflowKind::Custom => WorkflowDefinition::custom(workflow_name),
                })
            })
            .collect::<Result<Vec<_>, TenancyDomainError>>()?;

        let registration =
            AgentRegistration::new(agent_name, version, owner, definitions, &*self.clock)?;
        self.registry.register(&registration).await?;
        info!(
            agent = %registration.name(),
            version = registration.version(),
            workflows = registration.workflows().len(),
            "agent registered"
        );
        Ok(registration)
    }

    /// Resolves a fully qualified workflow type visible to `tenant_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentRegistryServiceError::WorkflowNotFound`] when the type
    /// is unknown or owned by another tenant.
    pub async fn resolve_workflow(
        &self,
        tenant_id: &TenantId,
        workflow_type: &WorkflowType,
    ) -> AgentRegistryServiceResult<RegisteredWorkflow> {
        self.registry
            .find_workflow(tenant_id, workflow_type)
            .await?
            .ok_or_else(|| AgentRegistryServiceError::WorkflowNotFound(workflow_type.to_string()))
    }

    /// Resolves a short name among the built-in workflows of `agent`.
    ///
    /// An exact match wins; otherwise the name is matched ignoring case and
    /// must identify exactly one workflow.
    ///
    /// # Errors
    ///
    /// Returns [`AgentRegistryServiceError::WorkflowNotFound`] when nothing
    /// matches and [`AgentRegistryServiceError::AmbiguousWorkflow`] when
    /// several workflows match.
    pub async fn resolve_builtin_by_name(
        &self,
        tenant_id: &TenantId,
        agent: &AgentName,
        name: &str,
    ) -> AgentRegistryServiceResult<RegisteredWorkflow> {
        self.resolve_named(tenant_id, agent, name, |kind| kind == WorkflowKind::BuiltIn)
            .await
    }

    /// Resolves a short name among all workflows of `agent`.
    ///
    /// # Errors
    ///
    /// As for [`Self::resolve_builtin_by_name`].
    pub async fn resolve_by_name(
        &self,
        tenant_id: &TenantId,
        agent: &AgentName,
        name: &str,
    ) -> AgentRegistryServiceResult<RegisteredWorkflow> {
        self.resolve_named(tenant_id, agent, name, |_| true).await
    }

    /// Lists the agents visible to `tenant_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentRegistryServiceError::Registry`] when the lookup fails.
    pub async fn list_agents(
        &self,
        tenant_id: &TenantId,
    ) -> AgentRegistryServiceResult<Vec<AgentRegistration>> {
        Ok(self.registry.list_agents(tenant_id).await?)
    }

    async fn resolve_named(
        &self,
        tenant_id: &TenantId,
        agent: &AgentName,
        name: &str,
        accepts: impl Fn(WorkflowKind) -> bool,
    ) -> AgentRegistryServiceResult<RegisteredWorkflow> {
        let not_found = || AgentRegistryServiceError::WorkflowNotFound(format!("{agent}:{name}"));
        let registration = self
            .registry
            .find_agent(tenant_id, agent)
            .await?
            .ok_or_else(not_found)?;

        let wanted = name.trim();
        let candidates: Vec<&WorkflowDefinition> = registration
            .workflows()
            .iter()
            .filter(|definition| accepts(definition.kind()))
            .collect();

        if let Some(exact) = candidates
            .iter()
            .find(|definition| definition.name().as_str() == wanted)
        {
            return Ok(registration.registered_workflow(exact));
        }

        let mut folded = candidates
            .iter()
            .filter(|definition| definition.name().as_str().eq_ignore_ascii_case(wanted));
        match (folded.next(), folded.next()) {
            (Some(only), None) => Ok(registration.registered_workflow(only)),
            (Some(_), Some(_)) => Err(AgentRegistryServiceError::AmbiguousWorkflow {
                agent: agent.clone(),
                name: wanted.to_owned(),
            }),
            (None, _) => Err(not_found()),
        }
    }
}

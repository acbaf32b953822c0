//! Arena-backed in-memory registry of agents and workflows.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::tenancy::{
    domain::{AgentName, AgentOwner, AgentRegistration, RegisteredWorkflow, TenantId, WorkflowType},
    ports::{WorkflowRegistry, WorkflowRegistryError, WorkflowRegistryResult},
};

/// Owner component of the index key; `None` marks a template.
type OwnerKey = Option<TenantId>;

/// Thread-safe in-memory workflow registry.
///
/// Registrations live in an append-only arena and are addressed through an
/// index keyed by owner and agent name.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkflowRegistry {
    state: Arc<RwLock<RegistryState>>,
}

#[derive(Debug, Default)]
struct RegistryState {
    agents: Vec<AgentRegistration>,
    index: HashMap<(OwnerKey, AgentName), usize>,
}

impl RegistryState {
    fn lookup(&self, tenant_id: &TenantId, name: &AgentName) -> Option<&AgentRegistration> {
        let owned = (Some(tenant_id.clone()), name.clone());
        let template = (None, name.clone());
        self.index
            .get(&owned)
            .or_else(|| self.index.get(&template))
            .and_then(|slot| self.agents.get(*slot))
    }
}

fn owner_key(owner: &AgentOwner) -> OwnerKey {
    match owner {
        AgentOwner::Tenant { tenant_id } => Some(tenant_id.clone()),
        AgentOwner::Template => None,
    }
}

impl InMemoryWorkflowRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkflowRegistry for InMemoryWorkflowRegistry {
    async fn register(&self, registration: &AgentRegistration) -> WorkflowRegistryResult<()> {
        let mut state = self.state.write().map_err(|err| {
            WorkflowRegistryError::persistence(std::io::Error::other(err.to_string()))
        })?;

        let key = (owner_key(registration.owner()), registration.name().clone());
        if state.index.contains_key(&key) {
            return Err(WorkflowRegistryError::DuplicateAgent {
                owner: registration.owner().clone(),
                name: registration.name().clone(),
            });
        }

        let slot = state.agents.len();
        state.agents.push(registration.clone());
        state.index.insert(key, slot);
        Ok(())
    }

    async fn find_agent(
        &self,
        tenant_id: &TenantId,
        name: &AgentName,
    ) -> WorkflowRegistryResult<Option<AgentRegistration>> {
        let state = self.state.read().map_err(|err| {
            WorkflowRegistryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(state.lookup(tenant_id, name).cloned())
    }

    async fn find_workflow(
        &self,
        tenant_id: &TenantId,
        workflow_type: &WorkflowType,
    ) -> WorkflowRegistryResult<Option<RegisteredWorkflow>> {
        let state = self.state.read().map_err(|err| {
            WorkflowRegistryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        let found = state
            .lookup(tenant_id, workflow_type.agent())
            .and_then(|agent| {
                agent
                    .workflow(workflow_type.workflow())
                    .map(|definition| agent.registered_workflow(definition))
            });
        Ok(found)
    }

    async fn list_agents(
        &self,
        tenant_id: &TenantId,
    ) -> WorkflowRegistryResult<Vec<AgentRegistration>> {
        let state = self.state.read().map_err(|err| {
            WorkflowRegistryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        let mut visible: Vec<AgentRegistration> = state
            .agents
            .iter()
            .filter(|agent| agent.is_visible_to(tenant_id))
            .filter(|agent| {
                // A template is hidden when the tenant owns an agent of the same name.
                *agent.owner() != AgentOwner::Template
                    || !state
                        .index
                        .contains_key(&(Some(tenant_id.clone()), agent.name().clone()))
            })
            .cloned()
            .collect();
        visible.sort_by(|left, right| left.name().cmp(right.name()));
        Ok(visible)
    }
}

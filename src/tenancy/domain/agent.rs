//! Agent registration aggregate and workflow definitions.

use super::{AgentName, TenancyDomainError, TenantId, WorkflowName, WorkflowType};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Whether a workflow ships with the agent runtime or is user-defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowKind {
    /// A workflow provided by the platform (conversational, webhook, ...).
    BuiltIn,
    /// A workflow written by the agent author.
    Custom,
}

/// A workflow declared by an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    name: WorkflowName,
    kind: WorkflowKind,
}

impl WorkflowDefinition {
    /// Declares a built-in workflow.
    #[must_use]
    pub const fn built_in(name: WorkflowName) -> Self {
        Self {
            name,
            kind: WorkflowKind::BuiltIn,
        }
    }

    /// Declares a custom workflow.
    #[must_use]
    pub const fn custom(name: WorkflowName) -> Self {
        Self {
            name,
            kind: WorkflowKind::Custom,
        }
    }

    /// Returns the short workflow name.
    #[must_use]
    pub const fn name(&self) -> &WorkflowName {
        &self.name
    }

    /// Returns the workflow kind.
    #[must_use]
    pub const fn kind(&self) -> WorkflowKind {
        self.kind
    }
}

/// Who may use an agent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentOwner {
    /// The agent belongs to one tenant.
    Tenant {
        /// The owning tenant.
        tenant_id: TenantId,
    },
    /// The agent is a template visible to every tenant.
    Template,
}

impl AgentOwner {
    /// Returns `true` when resources of `tenant_id` may use the agent.
    #[must_use]
    pub fn is_visible_to(&self, tenant_id: &TenantId) -> bool {
        match self {
            Self::Tenant { tenant_id: owner } => owner == tenant_id,
            Self::Template => true,
        }
    }
}

/// Agent registration aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRegistration {
    name: AgentName,
    version: String,
    owner: AgentOwner,
    workflows: Vec<WorkflowDefinition>,
    registered_at: DateTime<Utc>,
}

impl AgentRegistration {
    /// Creates a registration.
    ///
    /// # Errors
    ///
    /// Returns [`TenancyDomainError::EmptyAgentVersion`] for a blank version
    /// and [`TenancyDomainError::DuplicateWorkflow`] when two workflows share
    /// a name.
    pub fn new(
        name: AgentName,
        version: impl Into<String>,
        owner: AgentOwner,
        workflows: Vec<WorkflowDefinition>,
        clock: &(impl Clock + ?Sized),
    ) -> Result<Self, TenancyDomainError> {
        let raw_version = version.into();
        let trimmed_version = raw_version.trim();
        if trimmed_version.is_empty() {
            return Err(TenancyDomainError::EmptyAgentVersion);
        }

        let mut seen = HashSet::new();
        for definition in &workflows {
            if !seen.insert(definition.name()) {
                return Err(TenancyDomainError::DuplicateWorkflow {
                    agent: name.to_string(),
                    workflow: definition.name().to_string(),
                });
            }
        }

        Ok(Self {
            name,
            version: trimmed_version.to_owned(),
            owner,
            workflows,
            registered_at: clock.utc(),
        })
    }

    /// Returns the agent name.
    #[must_use]
    pub const fn name(&self) -> &AgentName {
        &self.name
    }

    /// Returns the registered version string.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the owner of the agent.
    #[must_use]
    pub const fn owner(&self) -> &AgentOwner {
        &self.owner
    }

    /// Returns the declared workflows.
    #[must_use]
    pub fn workflows(&self) -> &[WorkflowDefinition] {
        &self.workflows
    }

    /// Returns the registration timestamp.
    #[must_use]
    pub const fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    /// Returns `true` when the agent may be used by `tenant_id`.
    #[must_use]
    pub fn is_visible_to(&self, tenant_id: &TenantId) -> bool {
        self.owner.is_visible_to(tenant_id)
    }

    /// Looks up a declared workflow by short name.
    #[must_use]
    pub fn workflow(&self, name: &WorkflowName) -> Option<&WorkflowDefinition> {
        self.workflows.iter().find(|definition| definition.name() == name)
    }

    /// Returns the fully qualified registry entry for a declared workflow.
    #[must_use]
    pub fn registered_workflow(&self, definition: &WorkflowDefinition) -> RegisteredWorkflow {
        RegisteredWorkflow {
            workflow_type: WorkflowType::new(self.name.clone(), definition.name().clone()),
            kind: definition.kind(),
            owner: self.owner.clone(),
        }
    }
}

/// A resolved registry entry for one workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredWorkflow {
    /// Fully qualified workflow type.
    pub workflow_type: WorkflowType,
    /// Built-in or custom.
    pub kind: WorkflowKind,
    /// Owner of the agent declaring the workflow.
    pub owner: AgentOwner,
}

impl RegisteredWorkflow {
    /// Returns `true` for platform-provided workflows.
    #[must_use]
    pub fn is_built_in(&self) -> bool {
        self.kind == WorkflowKind::BuiltIn
    }
}

//! Explicit workflow context resolved once at the entry point.

use crate::tenancy::domain::{AgentName, CallerIdentity, TenantId, WorkflowType};
use serde::{Deserialize, Serialize};

/// Identity a workflow acts under when it sends messages.
///
/// Carries the authenticated tenant and the workflow type as plain data.
/// Every outbound operation takes a context instead of reading ambient
/// state.
///
/// # Examples
///
/// ```
/// use parley::delivery::domain::WorkflowContext;
/// use parley::tenancy::domain::{CallerIdentity, TenantId, WorkflowType};
///
/// let ctx = WorkflowContext::new(
///     CallerIdentity::new(TenantId::new("acme").expect("valid tenant")),
///     WorkflowType::parse("Support:Notifier").expect("valid type"),
/// );
/// assert_eq!(ctx.tenant_id().as_str(), "acme");
/// assert_eq!(ctx.agent().as_str(), "Support");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowContext {
    caller: CallerIdentity,
    workflow_type: WorkflowType,
}

impl WorkflowContext {
    /// Creates a context for a workflow acting on behalf of `caller`.
    #[must_use]
    pub const fn new(caller: CallerIdentity, workflow_type: WorkflowType) -> Self {
        Self {
            caller,
            workflow_type,
        }
    }

    /// Returns the authenticated caller.
    #[must_use]
    pub const fn caller(&self) -> &CallerIdentity {
        &self.caller
    }

    /// Returns the tenant the workflow runs in.
    #[must_use]
    pub const fn tenant_id(&self) -> &TenantId {
        self.caller.tenant_id()
    }

    /// Returns the workflow type.
    #[must_use]
    pub const fn workflow_type(&self) -> &WorkflowType {
        &self.workflow_type
    }

    /// Returns the agent owning the workflow.
    #[must_use]
    pub const fn agent(&self) -> &AgentName {
        self.workflow_type.agent()
    }

    /// Returns a context for another workflow of the same tenant.
    #[must_use]
    pub fn for_workflow(&self, workflow_type: WorkflowType) -> Self {
        Self::new(self.caller.clone(), workflow_type)
    }
}

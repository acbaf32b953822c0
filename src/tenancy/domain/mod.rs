//! Domain model for tenants, agents and workflows.

mod agent;
mod caller;
mod error;
mod ids;

pub use agent::{AgentOwner, AgentRegistration, RegisteredWorkflow, WorkflowDefinition, WorkflowKind};
pub use caller::CallerIdentity;
pub use error::TenancyDomainError;
pub use ids::{AgentName, TenantId, WorkflowName, WorkflowType};

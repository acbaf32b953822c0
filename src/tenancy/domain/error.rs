//! Error types for tenancy domain validation.

use thiserror::Error;

/// Errors returned while constructing tenancy domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TenancyDomainError {
    /// The tenant identifier is empty after trimming.
    #[error("tenant identifier must not be empty")]
    EmptyTenantId,

    /// The agent name is empty after trimming.
    #[error("agent name must not be empty")]
    EmptyAgentName,

    /// The workflow name is empty after trimming.
    #[error("workflow name must not be empty")]
    EmptyWorkflowName,

    /// A name contains the reserved `:` separator.
    #[error("name '{0}' must not contain ':'")]
    ReservedSeparator(String),

    /// A composite workflow type is not of the form `Agent:Workflow`.
    #[error("malformed workflow type '{0}', expected AgentName:WorkflowName")]
    MalformedWorkflowType(String),

    /// The agent version is empty after trimming.
    #[error("agent version must not be empty")]
    EmptyAgentVersion,

    /// An agent declares two workflows with the same name.
    #[error("agent '{agent}' declares workflow '{workflow}' more than once")]
    DuplicateWorkflow {
        /// The agent being registered.
        agent: String,
        /// The repeated workflow name.
        workflow: String,
    },
}

//! Validated identifiers for tenants, agents and workflows.

use super::TenancyDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between the agent and workflow parts of a [`WorkflowType`].
const TYPE_SEPARATOR: char = ':';

/// Identifier of a tenant, the top-level isolation boundary.
///
/// # Examples
///
/// ```
/// use parley::tenancy::domain::TenantId;
///
/// let tenant = TenantId::new("  acme ").expect("valid tenant");
/// assert_eq!(tenant.as_str(), "acme");
/// assert!(TenantId::new("   ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Creates a tenant identifier from a non-blank string.
    ///
    /// # Errors
    ///
    /// Returns [`TenancyDomainError::EmptyTenantId`] when the value is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, TenancyDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TenancyDomainError::EmptyTenantId);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name of a registered agent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentName(String);

impl AgentName {
    /// Creates an agent name.
    ///
    /// The value is trimmed; case is preserved.
    ///
    /// # Errors
    ///
    /// Returns [`TenancyDomainError::EmptyAgentName`] for blank input and
    /// [`TenancyDomainError::ReservedSeparator`] when the name contains `:`.
    pub fn new(value: impl Into<String>) -> Result<Self, TenancyDomainError> {
        validated_name(value.into(), TenancyDomainError::EmptyAgentName).map(Self)
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Short name of a workflow, unique within its agent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowName(String);

impl WorkflowName {
    /// Creates a workflow name.
    ///
    /// # Errors
    ///
    /// Returns [`TenancyDomainError::EmptyWorkflowName`] for blank input and
    /// [`TenancyDomainError::ReservedSeparator`] when the name contains `:`.
    pub fn new(value: impl Into<String>) -> Result<Self, TenancyDomainError> {
        validated_name(value.into(), TenancyDomainError::EmptyWorkflowName).map(Self)
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkflowName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn validated_name(raw: String, empty_error: TenancyDomainError) -> Result<String, TenancyDomainError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(empty_error);
    }
    if trimmed.contains(TYPE_SEPARATOR) {
        return Err(TenancyDomainError::ReservedSeparator(raw));
    }
    Ok(trimmed.to_owned())
}

/// Fully qualified workflow type, rendered as `AgentName:WorkflowName`.
///
/// # Examples
///
/// ```
/// use parley::tenancy::domain::WorkflowType;
///
/// let workflow_type = WorkflowType::parse("Support:Conversational").expect("valid type");
/// assert_eq!(workflow_type.agent().as_str(), "Support");
/// assert_eq!(workflow_type.workflow().as_str(), "Conversational");
/// assert_eq!(workflow_type.to_string(), "Support:Conversational");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkflowType {
    agent: AgentName,
    workflow: WorkflowName,
}

impl WorkflowType {
    /// Combines an agent and workflow name.
    #[must_use]
    pub const fn new(agent: AgentName, workflow: WorkflowName) -> Self {
        Self { agent, workflow }
    }

    /// Builds a workflow type from raw agent and workflow names.
    ///
    /// # Errors
    ///
    /// Returns a [`TenancyDomainError`] when either part is invalid.
    pub fn from_parts(agent: &str, workflow: &str) -> Result<Self, TenancyDomainError> {
        Ok(Self::new(AgentName::new(agent)?, WorkflowName::new(workflow)?))
    }

    /// Parses the composite `AgentName:WorkflowName` form.
    ///
    /// # Errors
    ///
    /// Returns [`TenancyDomainError::MalformedWorkflowType`] when the value
    /// does not contain exactly one separator, or the part-specific error
    /// when a part is blank.
    pub fn parse(value: &str) -> Result<Self, TenancyDomainError> {
        let mut parts = value.split(TYPE_SEPARATOR);
        let (Some(agent), Some(workflow), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(TenancyDomainError::MalformedWorkflowType(value.to_owned()));
        };
        Self::from_parts(agent, workflow)
    }

    /// Returns the owning agent name.
    #[must_use]
    pub const fn agent(&self) -> &AgentName {
        &self.agent
    }

    /// Returns the short workflow name.
    #[must_use]
    pub const fn workflow(&self) -> &WorkflowName {
        &self.workflow
    }
}

impl fmt::Display for WorkflowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{TYPE_SEPARATOR}{}", self.agent, self.workflow)
    }
}

impl TryFrom<String> for WorkflowType {
    type Error = TenancyDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<WorkflowType> for String {
    fn from(value: WorkflowType) -> Self {
        value.to_string()
    }
}

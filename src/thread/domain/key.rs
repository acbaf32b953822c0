//! The identity triple of a thread.

use super::{KeyPart, ParticipantId, ThreadDomainError};
use crate::tenancy::domain::{TenantId, WorkflowType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique key of a thread: tenant, workflow type and participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadKey {
    tenant_id: TenantId,
    workflow_type: WorkflowType,
    participant_id: ParticipantId,
}

impl ThreadKey {
    /// Creates a key from validated parts.
    #[must_use]
    pub const fn new(
        tenant_id: TenantId,
        workflow_type: WorkflowType,
        participant_id: ParticipantId,
    ) -> Self {
        Self {
            tenant_id,
            workflow_type,
            participant_id,
        }
    }

    /// Parses a key from raw strings.
    ///
    /// Blank parts are reported by [`KeyPart`] before any structural
    /// validation so callers see which part was missing.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadDomainError::EmptyKeyPart`] for a blank part and
    /// [`ThreadDomainError::InvalidKeyPart`] for a malformed workflow type.
    pub fn from_parts(
        tenant_id: &str,
        workflow_type: &str,
        participant_id: &str,
    ) -> Result<Self, ThreadDomainError> {
        for (part, raw) in [
            (KeyPart::Tenant, tenant_id),
            (KeyPart::Workflow, workflow_type),
            (KeyPart::Participant, participant_id),
        ] {
            if raw.trim().is_empty() {
                return Err(ThreadDomainError::EmptyKeyPart(part));
            }
        }
        Ok(Self::new(
            TenantId::new(tenant_id)?,
            WorkflowType::parse(workflow_type.trim())?,
            ParticipantId::new(participant_id)?,
        ))
    }

    /// Returns the tenant.
    #[must_use]
    pub const fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    /// Returns the workflow type.
    #[must_use]
    pub const fn workflow_type(&self) -> &WorkflowType {
        &self.workflow_type
    }

    /// Returns the participant.
    #[must_use]
    pub const fn participant_id(&self) -> &ParticipantId {
        &self.participant_id
    }
}

impl fmt::Display for ThreadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.tenant_id, self.workflow_type, self.participant_id
        )
    }
}

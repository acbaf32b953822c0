//! Authenticated caller identity.

use super::TenantId;
use serde::{Deserialize, Serialize};

/// The tenant a request was authenticated as.
///
/// Resolved once at the entry point (API key, admin token) and passed
/// explicitly to every operation that touches tenant data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallerIdentity {
    tenant_id: TenantId,
}

impl CallerIdentity {
    /// Creates an identity for the given tenant.
    #[must_use]
    pub const fn new(tenant_id: TenantId) -> Self {
        Self { tenant_id }
    }

    /// Returns the authenticated tenant.
    #[must_use]
    pub const fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    /// Returns `true` when the caller is authenticated as `tenant_id`.
    #[must_use]
    pub fn owns(&self, tenant_id: &TenantId) -> bool {
        &self.tenant_id == tenant_id
    }
}

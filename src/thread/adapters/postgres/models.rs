//! Diesel row models for thread persistence.

use super::schema::threads;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for thread records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = threads)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ThreadRow {
    /// Thread identifier.
    pub id: uuid::Uuid,
    /// Owning tenant.
    pub tenant_id: String,
    /// Composite workflow type.
    pub workflow_type: String,
    /// Participant identifier.
    pub participant_id: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert model for thread records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = threads)]
pub struct NewThreadRow {
    /// Thread identifier.
    pub id: uuid::Uuid,
    /// Owning tenant.
    pub tenant_id: String,
    /// Composite workflow type.
    pub workflow_type: String,
    /// Participant identifier.
    pub participant_id: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

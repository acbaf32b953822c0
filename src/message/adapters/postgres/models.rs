//! Diesel row models for message persistence.

use super::schema::{messages, scope_buckets};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Insert model for a new bucket row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = scope_buckets)]
pub struct NewScopeBucketRow {
    /// Deterministic bucket identifier.
    pub id: uuid::Uuid,
    /// Owning thread.
    pub thread_id: uuid::Uuid,
    /// Scope label.
    pub scope: Option<String>,
    /// Highest assigned sequence number.
    pub last_sequence: i64,
    /// Hint register.
    pub last_hint: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Query result row for messages.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MessageRow {
    /// Message identifier.
    pub id: uuid::Uuid,
    /// Bucket identifier.
    pub scope_bucket_id: uuid::Uuid,
    /// Owning thread.
    pub thread_id: uuid::Uuid,
    /// Scope label.
    pub scope: Option<String>,
    /// Thread participant.
    pub participant_id: String,
    /// Workflow type.
    pub workflow_type: String,
    /// Direction.
    pub direction: String,
    /// Payload discriminant.
    pub message_type: String,
    /// Origin JSON.
    pub origin: Value,
    /// Payload JSON.
    pub payload: Value,
    /// Metadata JSON.
    pub metadata: Value,
    /// Hint.
    pub hint: Option<String>,
    /// Correlation identifier.
    pub request_id: Option<String>,
    /// Authorization fingerprint.
    pub authorization_fingerprint: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Position within the bucket.
    pub sequence_number: i64,
}

/// Insert model for messages.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = messages)]
pub struct NewMessageRow {
    /// Message identifier.
    pub id: uuid::Uuid,
    /// Bucket identifier.
    pub scope_bucket_id: uuid::Uuid,
    /// Owning thread.
    pub thread_id: uuid::Uuid,
    /// Scope label.
    pub scope: Option<String>,
    /// Thread participant.
    pub participant_id: String,
    /// Workflow type.
    pub workflow_type: String,
    /// Direction.
    pub direction: String,
    /// Payload discriminant.
    pub message_type: String,
    /// Origin JSON.
    pub origin: Value,
    /// Payload JSON.
    pub payload: Value,
    /// Metadata JSON.
    pub metadata: Value,
    /// Hint.
    pub hint: Option<String>,
    /// Correlation identifier.
    pub request_id: Option<String>,
    /// Authorization fingerprint.
    pub authorization_fingerprint: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Position within the bucket.
    pub sequence_number: i64,
}

//! Diesel row models for task persistence.

use super::schema::tasks;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Addressed participant.
    pub participant_id: String,
    /// Linked thread.
    pub thread_id: Option<uuid::Uuid>,
    /// Linked scope.
    pub scope: Option<String>,
    /// Draft work.
    pub draft: Value,
    /// Permissible actions as a JSON array.
    pub allowed_actions: Value,
    /// Absolute deadline.
    pub deadline: Option<DateTime<Utc>>,
    /// Whether the task outlives its parent.
    pub survive_parent_close: bool,
    /// Lifecycle state.
    pub state: String,
    /// Performed action.
    pub performed_action: Option<String>,
    /// Comment.
    pub comment: Option<String>,
    /// Completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest transition timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for task records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Addressed participant.
    pub participant_id: String,
    /// Linked thread.
    pub thread_id: Option<uuid::Uuid>,
    /// Linked scope.
    pub scope: Option<String>,
    /// Draft work.
    pub draft: Value,
    /// Permissible actions as a JSON array.
    pub allowed_actions: Value,
    /// Absolute deadline.
    pub deadline: Option<DateTime<Utc>>,
    /// Whether the task outlives its parent.
    pub survive_parent_close: bool,
    /// Lifecycle state.
    pub state: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest transition timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Changeset written by a terminal transition.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(treat_none_as_null = true)]
pub struct TaskCompletionChanges {
    /// Terminal state.
    pub state: String,
    /// Performed action.
    pub performed_action: Option<String>,
    /// Comment.
    pub comment: Option<String>,
    /// Completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Transition timestamp.
    pub updated_at: DateTime<Utc>,
}

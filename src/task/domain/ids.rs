//! Identifier types for the task domain.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a human-in-the-loop task.
///
/// The identifier doubles as the hint that links a task to the
/// conversation in which it was announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Creates a new random task identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a task identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parses a task identifier from its hint form.
    ///
    /// Returns `None` when the hint is not a task identifier.
    #[must_use]
    pub fn from_hint(hint: &str) -> Option<Self> {
        Uuid::parse_str(hint.trim()).ok().map(Self)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<Uuid> for TaskId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Detached handle to a started task.
///
/// Holding a handle does not track the result; pass it to
/// [`crate::task::services::TaskCoordinator::await_result`] to wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskHandle {
    task_id: TaskId,
}

impl TaskHandle {
    /// Creates a handle for `task_id`.
    #[must_use]
    pub const fn new(task_id: TaskId) -> Self {
        Self { task_id }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn task_id(self) -> TaskId {
        self.task_id
    }
}

//! Task aggregate root, creation request and completion types.

use super::{ParseTaskStateError, TaskDomainError, TaskId};
use crate::thread::domain::{ParticipantId, Scope, ThreadId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Actions offered when a request names none.
pub const DEFAULT_ACTIONS: [&str; 2] = ["approve", "reject"];

/// Task lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Waiting for an action or the deadline.
    Pending,
    /// A permitted action was performed.
    CompletedByAction,
    /// The deadline passed without an action.
    CompletedByTimeout,
    /// The parent workflow went away and the task did not survive it.
    Abandoned,
}

impl TaskState {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::CompletedByAction => "completed_by_action",
            Self::CompletedByTimeout => "completed_by_timeout",
            Self::Abandoned => "abandoned",
        }
    }

    /// Returns `true` for every state other than [`Self::Pending`].
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl TryFrom<&str> for TaskState {
    type Error = ParseTaskStateError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "completed_by_action" => Ok(Self::CompletedByAction),
            "completed_by_timeout" => Ok(Self::CompletedByTimeout),
            "abandoned" => Ok(Self::Abandoned),
            _ => Err(ParseTaskStateError(value.to_owned())),
        }
    }
}

/// Request to create a task.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use parley::task::domain::TaskRequest;
/// use parley::thread::domain::ParticipantId;
///
/// let request = TaskRequest::new(
///     "Approve refund",
///     ParticipantId::new("u1").expect("valid participant"),
/// )
/// .with_description("Order 7, 40 EUR")
/// .with_timeout(Duration::from_secs(3600));
///
/// assert_eq!(request.actions(), ["approve", "reject"]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRequest {
    title: String,
    description: String,
    participant_id: ParticipantId,
    thread_id: Option<ThreadId>,
    scope: Scope,
    draft: Value,
    actions: Vec<String>,
    timeout: Option<Duration>,
    survive_parent_close: bool,
}

impl TaskRequest {
    /// Creates a request with the default actions and no timeout.
    #[must_use]
    pub fn new(title: impl Into<String>, participant_id: ParticipantId) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            participant_id,
            thread_id: None,
            scope: Scope::null(),
            draft: Value::Null,
            actions: DEFAULT_ACTIONS.iter().map(|action| (*action).to_owned()).collect(),
            timeout: None,
            survive_parent_close: false,
        }
    }

    /// Sets the description shown to the human.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Attaches the draft work the human reviews.
    #[must_use]
    pub fn with_draft(mut self, draft: Value) -> Self {
        self.draft = draft;
        self
    }

    /// Replaces the permissible actions.
    #[must_use]
    pub fn with_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions = actions.into_iter().map(Into::into).collect();
        self
    }

    /// Sets how long the task waits before timing out.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Keeps the task pending when its parent workflow is cancelled.
    #[must_use]
    pub const fn surviving_parent_close(mut self) -> Self {
        self.survive_parent_close = true;
        self
    }

    /// Links the task to a conversation thread and scope.
    #[must_use]
    pub fn linked_to(mut self, thread_id: ThreadId, scope: Scope) -> Self {
        self.thread_id = Some(thread_id);
        self.scope = scope;
        self
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the participant the task is addressed to.
    #[must_use]
    pub const fn participant_id(&self) -> &ParticipantId {
        &self.participant_id
    }

    /// Returns the linked scope.
    #[must_use]
    pub const fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Returns the permissible actions as given.
    #[must_use]
    pub fn actions(&self) -> &[String] {
        &self.actions
    }
}

/// How a terminal task ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutcome {
    /// Action performed by the human; `None` for timeouts and abandonment.
    pub performed_action: Option<String>,
    /// Comment left with the action.
    pub comment: Option<String>,
    /// When the task left the pending state.
    pub completed_at: DateTime<Utc>,
}

/// A requested transition out of [`TaskState::Pending`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCompletion {
    /// Target terminal state.
    pub state: TaskState,
    /// Outcome recorded with the transition.
    pub outcome: TaskOutcome,
}

impl TaskCompletion {
    /// Completion by a performed action.
    #[must_use]
    pub fn by_action(
        action: impl Into<String>,
        comment: Option<String>,
        clock: &(impl Clock + ?Sized),
    ) -> Self {
        Self {
            state: TaskState::CompletedByAction,
            outcome: TaskOutcome {
                performed_action: Some(action.into()),
                comment,
                completed_at: clock.utc(),
            },
        }
    }

    /// Completion by the deadline passing.
    #[must_use]
    pub fn by_timeout(clock: &(impl Clock + ?Sized)) -> Self {
        Self::without_action(TaskState::CompletedByTimeout, clock)
    }

    /// Abandonment after the parent workflow was cancelled.
    #[must_use]
    pub fn abandoned(clock: &(impl Clock + ?Sized)) -> Self {
        Self::without_action(TaskState::Abandoned, clock)
    }

    fn without_action(state: TaskState, clock: &(impl Clock + ?Sized)) -> Self {
        Self {
            state,
            outcome: TaskOutcome {
                performed_action: None,
                comment: None,
                completed_at: clock.utc(),
            },
        }
    }
}

/// Result handed to the workflow awaiting a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    /// Action performed by the human, if any.
    pub performed_action: Option<String>,
    /// Comment left with the action.
    pub comment: Option<String>,
    /// Whether the task ended by timeout.
    pub timed_out: bool,
}

/// Human-in-the-loop task.
///
/// Terminal tasks are immutable; the only transition is out of
/// [`TaskState::Pending`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    title: String,
    description: String,
    participant_id: ParticipantId,
    thread_id: Option<ThreadId>,
    scope: Scope,
    draft: Value,
    allowed_actions: Vec<String>,
    deadline: Option<DateTime<Utc>>,
    survive_parent_close: bool,
    state: TaskState,
    outcome: Option<TaskOutcome>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedTaskData {
    /// Task identifier.
    pub id: TaskId,
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Addressed participant.
    pub participant_id: ParticipantId,
    /// Linked thread, if any.
    pub thread_id: Option<ThreadId>,
    /// Linked scope.
    pub scope: Scope,
    /// Draft work under review.
    pub draft: Value,
    /// Permissible actions.
    pub allowed_actions: Vec<String>,
    /// Absolute deadline, if the task times out.
    pub deadline: Option<DateTime<Utc>>,
    /// Whether the task outlives its parent workflow.
    pub survive_parent_close: bool,
    /// Lifecycle state.
    pub state: TaskState,
    /// Outcome of a terminal task.
    pub outcome: Option<TaskOutcome>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest transition timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a pending task from a request.
    ///
    /// Action labels are trimmed and deduplicated in order. A timeout
    /// becomes an absolute deadline so that it survives restarts.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] for a blank title, an empty or blank
    /// action list, or a timeout too large for a deadline.
    pub fn new(request: TaskRequest, clock: &(impl Clock + ?Sized)) -> Result<Self, TaskDomainError> {
        let TaskRequest {
            title,
            description,
            participant_id,
            thread_id,
            scope,
            draft,
            actions,
            timeout,
            survive_parent_close,
        } = request;

        let trimmed_title = title.trim();
        if trimmed_title.is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }
        let allowed_actions = normalize_actions(actions)?;

        let now = clock.utc();
        let deadline = timeout
            .map(|wait| {
                chrono::Duration::from_std(wait)
                    .ok()
                    .and_then(|delta| now.checked_add_signed(delta))
                    .ok_or(TaskDomainError::TimeoutOutOfRange)
            })
            .transpose()?;

        Ok(Self {
            id: TaskId::new(),
            title: trimmed_title.to_owned(),
            description,
            participant_id,
            thread_id,
            scope,
            draft,
            allowed_actions,
            deadline,
            survive_parent_close,
            state: TaskState::Pending,
            outcome: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            description: data.description,
            participant_id: data.participant_id,
            thread_id: data.thread_id,
            scope: data.scope,
            draft: data.draft,
            allowed_actions: data.allowed_actions,
            deadline: data.deadline,
            survive_parent_close: data.survive_parent_close,
            state: data.state,
            outcome: data.outcome,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the addressed participant.
    #[must_use]
    pub const fn participant_id(&self) -> &ParticipantId {
        &self.participant_id
    }

    /// Returns the linked thread, if any.
    #[must_use]
    pub const fn thread_id(&self) -> Option<ThreadId> {
        self.thread_id
    }

    /// Returns the linked scope.
    #[must_use]
    pub const fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Returns the draft work under review.
    #[must_use]
    pub const fn draft(&self) -> &Value {
        &self.draft
    }

    /// Returns the permissible actions.
    #[must_use]
    pub fn allowed_actions(&self) -> &[String] {
        &self.allowed_actions
    }

    /// Returns `true` when `action` is permitted.
    #[must_use]
    pub fn allows(&self, action: &str) -> bool {
        let wanted = action.trim();
        self.allowed_actions.iter().any(|allowed| allowed == wanted)
    }

    /// Returns the absolute deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    /// Returns whether the task outlives its parent workflow.
    #[must_use]
    pub const fn survives_parent_close(&self) -> bool {
        self.survive_parent_close
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn state(&self) -> TaskState {
        self.state
    }

    /// Returns the outcome of a terminal task.
    #[must_use]
    pub const fn outcome(&self) -> Option<&TaskOutcome> {
        self.outcome.as_ref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest transition timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the awaited result once the task completed by action or
    /// timeout. Pending and abandoned tasks have no result.
    #[must_use]
    pub fn result(&self) -> Option<TaskResult> {
        let timed_out = match self.state {
            TaskState::CompletedByAction => false,
            TaskState::CompletedByTimeout => true,
            TaskState::Pending | TaskState::Abandoned => return None,
        };
        let outcome = self.outcome.as_ref()?;
        Some(TaskResult {
            performed_action: outcome.performed_action.clone(),
            comment: outcome.comment.clone(),
            timed_out,
        })
    }

    /// Returns the task after `completion`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::AlreadyTerminal`] when the task left
    /// pending already and [`TaskDomainError::NonTerminalCompletion`] when
    /// the completion targets [`TaskState::Pending`].
    pub fn complete(&self, completion: TaskCompletion) -> Result<Self, TaskDomainError> {
        if self.state.is_terminal() {
            return Err(TaskDomainError::AlreadyTerminal(self.id));
        }
        if !completion.state.is_terminal() {
            return Err(TaskDomainError::NonTerminalCompletion(self.id));
        }
        Ok(Self {
            state: completion.state,
            updated_at: completion.outcome.completed_at,
            outcome: Some(completion.outcome),
            ..self.clone()
        })
    }
}

fn normalize_actions(actions: Vec<String>) -> Result<Vec<String>, TaskDomainError> {
    let mut normalized: Vec<String> = Vec::with_capacity(actions.len());
    for action in actions {
        let label = action.trim();
        if label.is_empty() {
            return Err(TaskDomainError::BlankAction);
        }
        if !normalized.iter().any(|existing| existing == label) {
            normalized.push(label.to_owned());
        }
    }
    if normalized.is_empty() {
        return Err(TaskDomainError::NoActions);
    }
    Ok(normalized)
}

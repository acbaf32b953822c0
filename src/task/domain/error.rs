//! Error types for task domain validation and parsing.

use super::TaskId;
use thiserror::Error;

/// Errors returned while constructing or transitioning tasks.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The task was created without any permissible action.
    #[error("a task needs at least one allowed action")]
    NoActions,

    /// An action label is empty after trimming.
    #[error("action labels must not be blank")]
    BlankAction,

    /// The timeout cannot be represented as a deadline.
    #[error("task timeout is out of range")]
    TimeoutOutOfRange,

    /// The task already reached a terminal state.
    #[error("task {0} is already completed")]
    AlreadyTerminal(TaskId),

    /// A completion must move the task to a terminal state.
    #[error("task {0} can only be completed into a terminal state")]
    NonTerminalCompletion(TaskId),
}

/// Error returned while parsing task states from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task state: {0}")]
pub struct ParseTaskStateError(pub String);

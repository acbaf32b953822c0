//! Domain model for human-in-the-loop tasks.
//!
//! A task is created pending and leaves that state exactly once: by a
//! permitted action, by its deadline, or by abandonment when its parent
//! workflow goes away.

mod error;
mod ids;
mod task;

pub use error::{ParseTaskStateError, TaskDomainError};
pub use ids::{TaskHandle, TaskId};
pub use task::{
    DEFAULT_ACTIONS, PersistedTaskData, Task, TaskCompletion, TaskOutcome, TaskRequest,
    TaskResult, TaskState,
};

//! Application services for human-in-the-loop tasks.

mod coordinator;

pub use coordinator::{
    DEFAULT_POLL_INTERVAL, TaskCoordinator, TaskCoordinatorError, TaskCoordinatorResult,
};

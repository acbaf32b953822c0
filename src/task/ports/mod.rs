//! Port contracts for human-in-the-loop tasks.

pub mod repository;

pub use repository::{TaskRepository, TaskRepositoryError, TaskRepositoryResult, TaskTransition};

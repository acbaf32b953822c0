//! Port contracts for thread persistence.

pub mod repository;

pub use repository::{ThreadInsertOutcome, ThreadRepository, ThreadRepositoryError, ThreadRepositoryResult};

//! `PostgreSQL` adapter for thread persistence.

mod models;
mod repository;
pub(crate) mod schema;

pub use repository::{PostgresThreadRepository, ThreadPgPool};

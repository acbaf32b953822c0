//! `PostgreSQL` adapter for the message ledger.

mod models;
pub(crate) mod schema;
mod store;

pub use store::{MessagePgPool, PostgresMessageStore};

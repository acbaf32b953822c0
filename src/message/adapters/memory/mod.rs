//! In-memory message store.

mod store;

pub use store::InMemoryMessageStore;

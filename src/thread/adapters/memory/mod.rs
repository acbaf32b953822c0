//! In-memory thread repository.

mod repository;

pub use repository::InMemoryThreadRepository;

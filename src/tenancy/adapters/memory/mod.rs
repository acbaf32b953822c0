//! In-memory workflow registry.

mod registry;

pub use registry::InMemoryWorkflowRegistry;

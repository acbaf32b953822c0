//! Port contracts for the workflow registry.

pub mod registry;

pub use registry::{WorkflowRegistry, WorkflowRegistryError, WorkflowRegistryResult};

//! Application services for thread resolution.

mod registry;

pub use registry::{ThreadRegistryError, ThreadRegistryResult, ThreadRegistryService};

//! Adapter implementations for the workflow registry.

pub mod memory;

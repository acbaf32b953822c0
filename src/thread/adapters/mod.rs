//! Adapter implementations for thread persistence.

pub mod memory;
pub mod postgres;

//! Transport adapters.

pub mod memory;

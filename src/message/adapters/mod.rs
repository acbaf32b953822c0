//! Adapter implementations for message persistence.
//!
//! - [`memory`]: in-memory store for tests and single-process deployments
//! - [`postgres`]: `PostgreSQL` store using Diesel

pub mod memory;
pub mod postgres;

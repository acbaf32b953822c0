//! Unit tests for the delivery module.

pub(crate) mod fixtures;
mod router_tests;

//! Step definitions for conversation routing scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;

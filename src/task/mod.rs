//! Human-in-the-loop tasks and the durable wait coordinator.
//!
//! A task asks a participant to pick one of a fixed set of actions, with an
//! optional deadline. Workflows start a task, keep working, and later await
//! its result; the wait survives restarts because the pending task and its
//! absolute deadline are persisted. Exactly one of an action, a timeout or
//! an abandonment completes a task.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - The [`services::TaskCoordinator`] in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;

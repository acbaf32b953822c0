//! Conversation threads keyed by tenant, workflow and participant.
//!
//! A thread is the conversation container for one participant talking to
//! one workflow of one tenant. Exactly one thread exists per key; it is
//! created lazily on first use and never deleted. Threads are partitioned
//! into scope buckets (see [`domain::Scope`]), each an isolated
//! sub-conversation.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;

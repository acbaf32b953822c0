//! Message delivery: inbound routing, outbound sends and handler dispatch.
//!
//! The [`services::DeliveryRouter`] is the only path by which messages
//! enter or leave a thread. Inbound events resolve their thread and land
//! in a scope bucket before any handler runs. Outbound messages are stored
//! first and transmitted second, with bounded retries; a stored message is
//! never removed because its transmission failed.
//!
//! Workflows plug in as [`services::MessageHandler`] implementations
//! registered per workflow type. Agent-to-agent calls and webhook calls
//! both wait on a reply correlated by request id.
//!
//! # Architecture
//!
//! - **Domain**: inbound events, A2A requests, webhook and admin contracts
//! - **Ports**: [`ports::Transport`] to the external delivery surface
//! - **Adapters**: [`adapters::memory::RecordingTransport`]
//! - **Services**: router, dispatch, [`services::WebhookService`] and
//!   [`services::AdminMessagingService`]

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

#[cfg(test)]
pub(crate) mod tests;

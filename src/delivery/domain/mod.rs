//! Domain types for message delivery.
//!
//! Contexts, inbound events, agent-to-agent requests and the typed
//! contracts of the webhook surface and the admin messaging API.

mod a2a;
mod admin;
mod context;
mod inbound;
mod webhook;

pub use a2a::A2aRequest;
pub use admin::{AdminRequestError, AdminSendRequest};
pub use context::WorkflowContext;
pub use inbound::{InboundEvent, InboundReceipt};
pub use webhook::{WebhookInvocation, WebhookResponse};

//! Delivery services: routing, dispatch, webhooks and admin sends.

mod admin;
mod correlation;
mod dispatch;
mod responder;
mod router;
mod webhook;

pub use admin::AdminMessagingService;
pub use correlation::CorrelationTable;
pub use dispatch::{
    DispatchOutcome, FnHandler, HandlerContext, HandlerError, HandlerOutcome, HandlerRegistry,
    MessageHandler, handler_fn,
};
pub use responder::{DEFAULT_ANSWERED_RETENTION, ResponseClaim, WebhookResponder};
pub use router::DeliveryRouter;
pub use webhook::WebhookService;

//! Transport port: hands stored messages to the delivery surface.

use crate::message::domain::Message;
use async_trait::async_trait;
use thiserror::Error;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors returned by transport adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The surface could not be reached; the attempt may be retried.
    #[error("transport unavailable: {0}")]
    Unavailable(String),

    /// The surface refused the message.
    #[error("transport rejected message: {0}")]
    Rejected(String),
}

/// Delivery surface for outgoing messages (UI channel, chat bridge, ...).
///
/// Transmission happens after the message is stored, so adapters may be
/// called more than once for the same message when retrying.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Transmits a stored outgoing message.
    async fn transmit(&self, message: &Message) -> TransportResult<()>;
}

//! Outstanding agent-to-agent waits keyed by request id.

use crate::delivery::error::{DeliveryError, DeliveryResult};
use crate::message::domain::{Direction, Message, RequestId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::oneshot;

/// Table of callers waiting for a correlated reply.
///
/// Every stored outgoing message is offered to the table. When its request
/// id matches an outstanding wait, the message is handed to the waiter
/// instead of the transport.
#[derive(Debug, Clone, Default)]
pub struct CorrelationTable {
    pending: Arc<RwLock<HashMap<RequestId, oneshot::Sender<Message>>>>,
}

impl CorrelationTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a wait for the reply to `request_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Internal`] if the table is poisoned.
    pub fn register(&self, request_id: RequestId) -> DeliveryResult<oneshot::Receiver<Message>> {
        let (sender, receiver) = oneshot::channel();
        self.pending
            .write()
            .map_err(DeliveryError::internal)?
            .insert(request_id, sender);
        Ok(receiver)
    }

    /// Hands an outgoing message to the caller waiting on its request id.
    ///
    /// Returns `true` when a waiter received the message.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Internal`] if the table is poisoned.
    pub fn complete(&self, message: &Message) -> DeliveryResult<bool> {
        if message.direction() != Direction::Outgoing {
            return Ok(false);
        }
        let Some(request_id) = message.request_id() else {
            return Ok(false);
        };
        let waiter = self
            .pending
            .write()
            .map_err(DeliveryError::internal)?
            .remove(request_id);
        Ok(waiter.is_some_and(|sender| sender.send(message.clone()).is_ok()))
    }

    /// Drops the wait for `request_id`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Internal`] if the table is poisoned.
    pub fn cancel(&self, request_id: &RequestId) -> DeliveryResult<()> {
        self.pending
            .write()
            .map_err(DeliveryError::internal)?
            .remove(request_id);
        Ok(())
    }

    /// Returns the number of outstanding waits.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Internal`] if the table is poisoned.
    pub fn outstanding(&self) -> DeliveryResult<usize> {
        Ok(self.pending.read().map_err(DeliveryError::internal)?.len())
    }
}

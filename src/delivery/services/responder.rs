//! Exactly-once response slots for inbound webhook calls.

use crate::delivery::{
    domain::WebhookResponse,
    error::{DeliveryError, DeliveryResult},
};
use crate::message::domain::{Message, MessagePayload, RequestId};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};
use tokio::sync::oneshot;

/// Default number of answered request ids remembered for duplicate checks.
pub const DEFAULT_ANSWERED_RETENTION: usize = 4_096;

#[derive(Debug)]
enum ResponseSlot {
    Open {
        origin: Message,
        waiter: oneshot::Sender<WebhookResponse>,
    },
    Sending,
    Answered,
}

#[derive(Debug, Default)]
struct Slots {
    by_request: HashMap<RequestId, ResponseSlot>,
    answered: VecDeque<RequestId>,
}

/// A claimed response slot, held while the response is being stored.
///
/// Hand it back with [`WebhookResponder::settle`] once the response is
/// persisted, or with [`WebhookResponder::reopen`] when storing failed.
#[derive(Debug)]
pub struct ResponseClaim {
    request_id: RequestId,
    origin: Message,
    waiter: oneshot::Sender<WebhookResponse>,
}

impl ResponseClaim {
    /// The stored webhook call being answered.
    #[must_use]
    pub const fn origin(&self) -> &Message {
        &self.origin
    }
}

/// Tracks which webhook requests still await their response.
///
/// A slot moves from open to answered exactly once. A slot whose response
/// could not be stored goes back to open. The most recent answered request
/// ids are remembered, up to the retention limit, so a second response is
/// rejected instead of being mistaken for an unknown request. A call that
/// timed out is closed and forgotten.
#[derive(Debug, Clone)]
pub struct WebhookResponder {
    slots: Arc<RwLock<Slots>>,
    retention: usize,
}

impl Default for WebhookResponder {
    fn default() -> Self {
        Self::new()
    }
}

impl WebhookResponder {
    /// Creates an empty responder with the default retention.
    #[must_use]
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_ANSWERED_RETENTION)
    }

    /// Creates an empty responder remembering at most `retention` answered
    /// request ids.
    #[must_use]
    pub fn with_retention(retention: usize) -> Self {
        Self {
            slots: Arc::new(RwLock::new(Slots::default())),
            retention: retention.max(1),
        }
    }

    /// Opens a response slot for a stored webhook message.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::MissingRequestId`] when the message has no
    /// request id and [`DeliveryError::Internal`] when it is not a webhook
    /// message or a slot for the request id already exists.
    pub fn open(&self, origin: &Message) -> DeliveryResult<oneshot::Receiver<WebhookResponse>> {
        let request_id = origin
            .request_id()
            .cloned()
            .ok_or_else(|| DeliveryError::MissingRequestId(origin.id()))?;
        if !matches!(origin.payload(), MessagePayload::Webhook(_)) {
            return Err(DeliveryError::internal(format_args!(
                "message {} is not a webhook call",
                origin.id()
            )));
        }

        let mut slots = self.slots.write().map_err(DeliveryError::internal)?;
        if slots.by_request.contains_key(&request_id) {
            return Err(DeliveryError::internal(format_args!(
                "webhook request {request_id} is already open"
            )));
        }
        let (waiter, receiver) = oneshot::channel();
        slots.by_request.insert(
            request_id,
            ResponseSlot::Open {
                origin: origin.clone(),
                waiter,
            },
        );
        Ok(receiver)
    }

    /// Claims an open slot so its response can be stored.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::DuplicateResponse`] when the request was
    /// answered or another response is being stored, and
    /// [`DeliveryError::UnknownRequest`] when no such request is open.
    pub fn claim(&self, request_id: &RequestId) -> DeliveryResult<ResponseClaim> {
        let mut slots = self.slots.write().map_err(DeliveryError::internal)?;
        match slots.by_request.remove(request_id) {
            Some(ResponseSlot::Open { origin, waiter }) => {
                slots
                    .by_request
                    .insert(request_id.clone(), ResponseSlot::Sending);
                Ok(ResponseClaim {
                    request_id: request_id.clone(),
                    origin,
                    waiter,
                })
            }
            Some(busy @ (ResponseSlot::Sending | ResponseSlot::Answered)) => {
                slots.by_request.insert(request_id.clone(), busy);
                Err(DeliveryError::DuplicateResponse {
                    request_id: request_id.clone(),
                })
            }
            None => Err(DeliveryError::UnknownRequest(request_id.clone())),
        }
    }

    /// Returns a claim whose response could not be stored.
    ///
    /// The slot becomes open again unless the call was closed meanwhile.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Internal`] if the responder is poisoned.
    pub fn reopen(&self, claim: ResponseClaim) -> DeliveryResult<()> {
        let mut slots = self.slots.write().map_err(DeliveryError::internal)?;
        let ResponseClaim {
            request_id,
            origin,
            waiter,
        } = claim;
        if let Some(slot) = slots
            .by_request
            .get_mut(&request_id)
            .filter(|slot| matches!(slot, ResponseSlot::Sending))
        {
            *slot = ResponseSlot::Open { origin, waiter };
        }
        Ok(())
    }

    /// Marks a claimed request answered and hands the response to its
    /// caller.
    ///
    /// Returns `false` when the caller stopped waiting.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Internal`] if the responder is poisoned.
    pub fn settle(&self, claim: ResponseClaim, response: WebhookResponse) -> DeliveryResult<bool> {
        let ResponseClaim {
            request_id, waiter, ..
        } = claim;
        {
            let mut slots = self.slots.write().map_err(DeliveryError::internal)?;
            slots
                .by_request
                .insert(request_id.clone(), ResponseSlot::Answered);
            slots.answered.push_back(request_id);
            while slots.answered.len() > self.retention {
                let Some(evicted) = slots.answered.pop_front() else {
                    break;
                };
                if matches!(
                    slots.by_request.get(&evicted),
                    Some(ResponseSlot::Answered)
                ) {
                    slots.by_request.remove(&evicted);
                }
            }
        }
        Ok(waiter.send(response).is_ok())
    }

    /// Closes a call whose caller stopped waiting.
    ///
    /// Returns the stored call when it was still open, so the caller can
    /// record the response it actually received. A later response for the
    /// request id is rejected as unknown.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Internal`] if the responder is poisoned.
    pub fn close(&self, request_id: &RequestId) -> DeliveryResult<Option<Message>> {
        let mut slots = self.slots.write().map_err(DeliveryError::internal)?;
        match slots.by_request.remove(request_id) {
            Some(ResponseSlot::Open { origin, .. }) => Ok(Some(origin)),
            Some(ResponseSlot::Answered) => {
                slots
                    .by_request
                    .insert(request_id.clone(), ResponseSlot::Answered);
                Ok(None)
            }
            Some(ResponseSlot::Sending) | None => Ok(None),
        }
    }

    /// Returns `true` once a response was sent for `request_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Internal`] if the responder is poisoned.
    pub fn is_answered(&self, request_id: &RequestId) -> DeliveryResult<bool> {
        let slots = self.slots.read().map_err(DeliveryError::internal)?;
        Ok(matches!(
            slots.by_request.get(request_id),
            Some(ResponseSlot::Answered)
        ))
    }

    /// Returns the number of tracked request ids.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Internal`] if the responder is poisoned.
    pub fn tracked(&self) -> DeliveryResult<usize> {
        let slots = self.slots.read().map_err(DeliveryError::internal)?;
        Ok(slots.by_request.len())
    }
}

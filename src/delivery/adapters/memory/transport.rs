//! Transport that records transmitted messages.

use crate::delivery::ports::{Transport, TransportError, TransportResult};
use crate::message::domain::Message;
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

/// In-memory transport adapter.
///
/// Keeps every transmitted message in order and can be told to fail a
/// number of upcoming attempts, which makes retry behaviour observable
/// without a network.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    state: Arc<RwLock<RecordingState>>,
}

#[derive(Debug, Default)]
struct RecordingState {
    delivered: Vec<Message>,
    attempts: u32,
    failures_remaining: u32,
}

impl RecordingTransport {
    /// Creates an empty transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` transmissions fail as unavailable.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Unavailable`] if the lock is poisoned.
    pub fn fail_next(&self, count: u32) -> TransportResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| TransportError::Unavailable(err.to_string()))?;
        state.failures_remaining = count;
        Ok(())
    }

    /// Returns the messages delivered so far, in transmission order.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Unavailable`] if the lock is poisoned.
    pub fn delivered(&self) -> TransportResult<Vec<Message>> {
        let state = self
            .state
            .read()
            .map_err(|err| TransportError::Unavailable(err.to_string()))?;
        Ok(state.delivered.clone())
    }

    /// Returns the texts of delivered messages, in transmission order.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Unavailable`] if the lock is poisoned.
    pub fn delivered_texts(&self) -> TransportResult<Vec<String>> {
        Ok(self
            .delivered()?
            .iter()
            .filter_map(|message| message.payload().text().map(str::to_owned))
            .collect())
    }

    /// Returns the number of transmission attempts, failed ones included.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Unavailable`] if the lock is poisoned.
    pub fn attempts(&self) -> TransportResult<u32> {
        let state = self
            .state
            .read()
            .map_err(|err| TransportError::Unavailable(err.to_string()))?;
        Ok(state.attempts)
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn transmit(&self, message: &Message) -> TransportResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| TransportError::Unavailable(err.to_string()))?;
        state.attempts = state.attempts.saturating_add(1);
        if state.failures_remaining > 0 {
            state.failures_remaining = state.failures_remaining.saturating_sub(1);
            return Err(TransportError::Unavailable(format!(
                "simulated outage for message {}",
                message.id()
            )));
        }
        state.delivered.push(message.clone());
        Ok(())
    }
}

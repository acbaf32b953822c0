//! Hint register per (thread, scope) bucket.
//!
//! Hints are short strings attached to messages. A workflow uses them to
//! remember what the last exchange was about, for example the id of the
//! task a notification refers to.

use crate::message::{error::MessageStoreError, ports::MessageStore};
use crate::thread::domain::{Scope, ThreadId};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by the hint overlay.
#[derive(Debug, Error)]
pub enum HintOverlayError {
    /// Hints must contain non-whitespace characters.
    #[error("hint must not be blank")]
    BlankHint,

    /// The message store failed.
    #[error(transparent)]
    Store(#[from] MessageStoreError),
}

/// Reads and writes the hint register of scope buckets.
#[derive(Clone)]
pub struct HintOverlay {
    store: Arc<dyn MessageStore>,
}

impl HintOverlay {
    /// Creates an overlay over a message store.
    #[must_use]
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self { store }
    }

    /// Overwrites the hint register of the bucket.
    ///
    /// # Errors
    ///
    /// Returns [`HintOverlayError::BlankHint`] for a blank hint and
    /// [`HintOverlayError::Store`] when the write fails.
    pub async fn set_hint(
        &self,
        thread_id: ThreadId,
        scope: &Scope,
        hint: impl Into<String> + Send,
    ) -> Result<(), HintOverlayError> {
        let value = hint.into();
        if value.trim().is_empty() {
            return Err(HintOverlayError::BlankHint);
        }
        self.store.set_hint(thread_id, scope, value).await?;
        Ok(())
    }

    /// Returns the most recent hint of the bucket.
    ///
    /// # Errors
    ///
    /// Returns [`HintOverlayError::Store`] when the read fails.
    pub async fn get_last_hint(
        &self,
        thread_id: ThreadId,
        scope: &Scope,
    ) -> Result<Option<String>, HintOverlayError> {
        Ok(self.store.last_hint(thread_id, scope).await?)
    }
}

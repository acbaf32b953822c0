//! Scope index: placement of drafts and paged history per bucket.

use crate::config::HistoryConfig;
use crate::message::{
    domain::{HistoryPage, Message, MessageDraft, MessageId, PageRequest, PageRequestError},
    error::{MessageStoreError, ValidationError},
    ports::{MessageStore, MessageValidator},
};
use crate::thread::domain::{Scope, ScopeBucketId, ThreadId};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors raised by the scope index.
#[derive(Debug, Error)]
pub enum ScopeIndexError {
    /// The draft failed validation and was not stored.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The page number or page size was zero.
    #[error("invalid page: {0}")]
    InvalidPage(#[from] PageRequestError),

    /// The message store failed.
    #[error(transparent)]
    Store(#[from] MessageStoreError),
}

/// Result type for scope index operations.
pub type ScopeIndexResult<T> = Result<T, ScopeIndexError>;

/// Places messages into (thread, scope) buckets and reads them back.
///
/// Every bucket, including the null-scope bucket, is a separate ordered
/// sequence. Reads never mix buckets.
#[derive(Clone)]
pub struct ScopeIndex {
    store: Arc<dyn MessageStore>,
    validator: Arc<dyn MessageValidator>,
    history: HistoryConfig,
}

impl ScopeIndex {
    /// Creates a scope index over a message store.
    #[must_use]
    pub fn new(
        store: Arc<dyn MessageStore>,
        validator: Arc<dyn MessageValidator>,
        history: HistoryConfig,
    ) -> Self {
        Self {
            store,
            validator,
            history,
        }
    }

    /// Returns the underlying message store.
    #[must_use]
    pub const fn store(&self) -> &Arc<dyn MessageStore> {
        &self.store
    }

    /// Returns the configured paging limits.
    #[must_use]
    pub const fn history_config(&self) -> HistoryConfig {
        self.history
    }

    /// Validates a draft and appends it to the bucket of `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeIndexError::Validation`] when the draft is rejected
    /// and [`ScopeIndexError::Store`] when the append fails.
    pub async fn place(
        &self,
        thread_id: ThreadId,
        scope: &Scope,
        draft: MessageDraft,
    ) -> ScopeIndexResult<(ScopeBucketId, Message)> {
        self.validator.validate(&draft)?;
        let bucket_id = ScopeBucketId::derive(thread_id, scope);
        let message = self.store.append(thread_id, scope, draft).await?;
        debug!(
            thread_id = %thread_id,
            scope = %scope,
            message_id = %message.id(),
            sequence = message.sequence_number().value(),
            "message placed"
        );
        Ok((bucket_id, message))
    }

    /// Returns one page of a bucket, newest message first.
    ///
    /// `page` is 1-indexed. `page_size` is clamped to the configured
    /// maximum. Pages past the end are empty.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeIndexError::InvalidPage`] when `page` or `page_size`
    /// is zero and [`ScopeIndexError::Store`] when the query fails.
    pub async fn history(
        &self,
        thread_id: ThreadId,
        scope: &Scope,
        page: u32,
        page_size: u32,
    ) -> ScopeIndexResult<HistoryPage> {
        let request = PageRequest::new(page, self.history.clamp_page_size(page_size))?;
        Ok(self.store.history(thread_id, scope, request).await?)
    }

    /// Returns the first page using the configured default page size.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeIndexError::Store`] when the query fails.
    pub async fn latest(&self, thread_id: ThreadId, scope: &Scope) -> ScopeIndexResult<HistoryPage> {
        self.history(thread_id, scope, 1, self.history.default_page_size)
            .await
    }

    /// Retrieves a message by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeIndexError::Store`] when the query fails.
    pub async fn get(&self, id: MessageId) -> ScopeIndexResult<Option<Message>> {
        Ok(self.store.get(id).await?)
    }
}

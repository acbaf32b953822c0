//! Store port for the append-only message ledger.

use crate::message::{
    domain::{HistoryPage, Message, MessageDraft, MessageId, PageRequest},
    error::MessageStoreError,
};
use crate::thread::domain::{Scope, ThreadId};
use async_trait::async_trait;

/// Result type for message store operations.
pub type MessageStoreResult<T> = Result<T, MessageStoreError>;

/// Port for the message ledger.
///
/// # Implementation Notes
///
/// Implementations must ensure:
/// - appends to one (thread, scope) bucket are serialised and numbered
///   1, 2, 3, ... without gaps
/// - a message is durable before `append` returns
/// - messages are never updated or deleted
/// - history never mixes buckets; the null scope is a bucket of its own
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Appends a draft to the (thread, scope) bucket.
    ///
    /// When the draft carries a hint the bucket's hint register is updated
    /// in the same atomic step.
    ///
    /// # Errors
    ///
    /// Returns `MessageStoreError` if storage fails.
    async fn append(
        &self,
        thread_id: ThreadId,
        scope: &Scope,
        draft: MessageDraft,
    ) -> MessageStoreResult<Message>;

    /// Retrieves a message by identifier.
    ///
    /// # Errors
    ///
    /// Returns `MessageStoreError` if the query fails.
    async fn get(&self, id: MessageId) -> MessageStoreResult<Option<Message>>;

    /// Returns one page of a bucket, newest message first.
    ///
    /// Pages past the end are empty.
    ///
    /// # Errors
    ///
    /// Returns `MessageStoreError` if the query fails.
    async fn history(
        &self,
        thread_id: ThreadId,
        scope: &Scope,
        page: PageRequest,
    ) -> MessageStoreResult<HistoryPage>;

    /// Overwrites the hint register of a bucket.
    ///
    /// # Errors
    ///
    /// Returns `MessageStoreError` if storage fails.
    async fn set_hint(&self, thread_id: ThreadId, scope: &Scope, hint: String)
    -> MessageStoreResult<()>;

    /// Returns the hint register of a bucket.
    ///
    /// # Errors
    ///
    /// Returns `MessageStoreError` if the query fails.
    async fn last_hint(&self, thread_id: ThreadId, scope: &Scope)
    -> MessageStoreResult<Option<String>>;
}

//! Message store holding every bucket behind one lock.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::clock::SharedClock;
use crate::message::{
    domain::{HistoryPage, Message, MessageDraft, MessageId, PageRequest, SequenceNumber},
    error::MessageStoreError,
    ports::{MessageStore, MessageStoreResult},
};
use crate::thread::domain::{Scope, ScopeBucketId, ThreadId};

/// Thread-safe in-memory message store.
///
/// Appends take the write lock for the whole placement, which serialises
/// them per bucket (and globally).
#[derive(Clone)]
pub struct InMemoryMessageStore {
    state: Arc<RwLock<StoreState>>,
    clock: SharedClock,
}

#[derive(Debug, Default)]
struct StoreState {
    messages: HashMap<MessageId, Message>,
    buckets: HashMap<ScopeBucketId, Bucket>,
}

#[derive(Debug, Default)]
struct Bucket {
    /// Message ids in append order.
    ordered: Vec<MessageId>,
    hint: Option<String>,
}

impl InMemoryMessageStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(clock: SharedClock) -> Self {
        Self {
            state: Arc::default(),
            clock,
        }
    }

    /// Returns every message of a bucket in append order.
    ///
    /// # Errors
    ///
    /// Returns [`MessageStoreError::Persistence`] if the lock is poisoned.
    pub fn bucket_snapshot(&self, thread_id: ThreadId, scope: &Scope) -> MessageStoreResult<Vec<Message>> {
        let state = self.state.read().map_err(|err| {
            MessageStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;
        let bucket_id = ScopeBucketId::derive(thread_id, scope);
        Ok(state
            .buckets
            .get(&bucket_id)
            .map(|bucket| {
                bucket
                    .ordered
                    .iter()
                    .filter_map(|id| state.messages.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn append(
        &self,
        thread_id: ThreadId,
        scope: &Scope,
        draft: MessageDraft,
    ) -> MessageStoreResult<Message> {
        let mut state = self.state.write().map_err(|err| {
            MessageStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;

        let bucket_id = ScopeBucketId::derive(thread_id, scope);
        let bucket = state.buckets.entry(bucket_id).or_default();
        let sequence = u64::try_from(bucket.ordered.len())
            .map(|count| SequenceNumber::new(count).next())
            .map_err(|err| MessageStoreError::serialization(err.to_string()))?;

        let message = Message::from_draft(thread_id, scope.clone(), draft, sequence, &*self.clock);
        bucket.ordered.push(message.id());
        if let Some(hint) = message.hint() {
            bucket.hint = Some(hint.to_owned());
        }
        state.messages.insert(message.id(), message.clone());
        Ok(message)
    }

    async fn get(&self, id: MessageId) -> MessageStoreResult<Option<Message>> {
        let state = self.state.read().map_err(|err| {
            MessageStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(state.messages.get(&id).cloned())
    }

    async fn history(
        &self,
        thread_id: ThreadId,
        scope: &Scope,
        page: PageRequest,
    ) -> MessageStoreResult<HistoryPage> {
        let state = self.state.read().map_err(|err| {
            MessageStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;

        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let page_size = usize::try_from(page.page_size()).unwrap_or(usize::MAX);
        let ordered = state
            .buckets
            .get(&ScopeBucketId::derive(thread_id, scope))
            .map(|bucket| bucket.ordered.as_slice())
            .unwrap_or_default();

        let messages = ordered
            .iter()
            .rev()
            .skip(offset)
            .take(page_size)
            .filter_map(|id| state.messages.get(id).cloned())
            .collect();
        let has_more = ordered.len() > offset.saturating_add(page_size);

        Ok(HistoryPage {
            messages,
            page: page.page(),
            page_size: page.page_size(),
            has_more,
        })
    }

    async fn set_hint(
        &self,
        thread_id: ThreadId,
        scope: &Scope,
        hint: String,
    ) -> MessageStoreResult<()> {
        let mut state = self.state.write().map_err(|err| {
            MessageStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;
        state
            .buckets
            .entry(ScopeBucketId::derive(thread_id, scope))
            .or_default()
            .hint = Some(hint);
        Ok(())
    }

    async fn last_hint(
        &self,
        thread_id: ThreadId,
        scope: &Scope,
    ) -> MessageStoreResult<Option<String>> {
        let state = self.state.read().map_err(|err| {
            MessageStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(state
            .buckets
            .get(&ScopeBucketId::derive(thread_id, scope))
            .and_then(|bucket| bucket.hint.clone()))
    }
}

//! `PostgreSQL` implementation of the message store.
//!
//! Every append runs in one transaction: the bucket row is upserted and
//! locked with `SELECT ... FOR UPDATE`, the message is inserted with the
//! next sequence number, and the bucket counter and hint register are
//! advanced. The unique index on `(scope_bucket_id, sequence_number)`
//! backs the ordering guarantee.

use super::{
    models::{MessageRow, NewMessageRow, NewScopeBucketRow},
    schema::{messages, scope_buckets},
};
use crate::clock::SharedClock;
use crate::message::{
    domain::{
        AuthorizationFingerprint, Direction, HistoryPage, Message, MessageDraft, MessageId,
        MessageMetadata, MessageOrigin, MessagePayload, PageRequest, PersistedMessageData,
        RequestId, SequenceNumber,
    },
    error::MessageStoreError,
    ports::{MessageStore, MessageStoreResult},
};
use crate::tenancy::domain::WorkflowType;
use crate::thread::domain::{ParticipantId, Scope, ScopeBucketId, ThreadId};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use mockable::Clock;
use std::sync::Arc;

/// `PostgreSQL` connection pool type used by message adapters.
pub type MessagePgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed message store.
#[derive(Clone)]
pub struct PostgresMessageStore {
    pool: MessagePgPool,
    clock: SharedClock,
}

impl PostgresMessageStore {
    /// Creates a new store from a connection pool.
    #[must_use]
    pub const fn new(pool: MessagePgPool, clock: SharedClock) -> Self {
        Self { pool, clock }
    }

    async fn run_blocking<F, T>(&self, f: F) -> MessageStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> MessageStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool
                .get()
                .map_err(|e| MessageStoreError::connection(e.to_string()))?;
            f(&mut connection)
        })
        .await
        .map_err(|e| MessageStoreError::connection(format!("task join error: {e}")))?
    }
}

#[async_trait]
impl MessageStore for PostgresMessageStore {
    async fn append(
        &self,
        thread_id: ThreadId,
        scope: &Scope,
        draft: MessageDraft,
    ) -> MessageStoreResult<Message> {
        let bucket_id = ScopeBucketId::derive(thread_id, scope);
        let placed_scope = scope.clone();
        let clock = Arc::clone(&self.clock);

        self.run_blocking(move |connection| {
            connection.transaction::<_, MessageStoreError, _>(|tx| {
                ensure_bucket(tx, bucket_id, thread_id, &placed_scope, clock.utc())?;

                let last: i64 = scope_buckets::table
                    .filter(scope_buckets::id.eq(bucket_id.into_inner()))
                    .select(scope_buckets::last_sequence)
                    .for_update()
                    .first(tx)?;
                let sequence = SequenceNumber::new(
                    u64::try_from(last)
                        .map_err(|e| MessageStoreError::serialization(e.to_string()))?,
                )
                .next();

                let message = Message::from_draft(thread_id, placed_scope, draft, sequence, &*clock);
                let row = to_new_row(bucket_id, &message)?;
                diesel::insert_into(messages::table)
                    .values(&row)
                    .execute(tx)?;

                let bucket = scope_buckets::table.filter(scope_buckets::id.eq(bucket_id.into_inner()));
                match message.hint() {
                    Some(hint) => diesel::update(bucket)
                        .set((
                            scope_buckets::last_sequence.eq(row.sequence_number),
                            scope_buckets::last_hint.eq(hint),
                        ))
                        .execute(tx)?,
                    None => diesel::update(bucket)
                        .set(scope_buckets::last_sequence.eq(row.sequence_number))
                        .execute(tx)?,
                };
                Ok(message)
            })
        })
        .await
    }

    async fn get(&self, id: MessageId) -> MessageStoreResult<Option<Message>> {
        self.run_blocking(move |connection| {
            let row = messages::table
                .filter(messages::id.eq(id.into_inner()))
                .select(MessageRow::as_select())
                .first::<MessageRow>(connection)
                .optional()?;
            row.map(row_to_message).transpose()
        })
        .await
    }

    async fn history(
        &self,
        thread_id: ThreadId,
        scope: &Scope,
        page: PageRequest,
    ) -> MessageStoreResult<HistoryPage> {
        let bucket_id = ScopeBucketId::derive(thread_id, scope);
        let offset =
            i64::try_from(page.offset()).map_err(|e| MessageStoreError::serialization(e.to_string()))?;
        let page_size = usize::try_from(page.page_size())
            .map_err(|e| MessageStoreError::serialization(e.to_string()))?;
        // One extra row tells whether an older page exists.
        let limit = i64::from(page.page_size()).saturating_add(1);

        self.run_blocking(move |connection| {
            let mut rows = messages::table
                .filter(messages::scope_bucket_id.eq(bucket_id.into_inner()))
                .order(messages::sequence_number.desc())
                .offset(offset)
                .limit(limit)
                .select(MessageRow::as_select())
                .load::<MessageRow>(connection)?;

            let has_more = rows.len() > page_size;
            rows.truncate(page_size);
            let page_messages = rows
                .into_iter()
                .map(row_to_message)
                .collect::<MessageStoreResult<Vec<_>>>()?;

            Ok(HistoryPage {
                messages: page_messages,
                page: page.page(),
                page_size: page.page_size(),
                has_more,
            })
        })
        .await
    }

    async fn set_hint(
        &self,
        thread_id: ThreadId,
        scope: &Scope,
        hint: String,
    ) -> MessageStoreResult<()> {
        let row = NewScopeBucketRow {
            id: ScopeBucketId::derive(thread_id, scope).into_inner(),
            thread_id: thread_id.into_inner(),
            scope: scope.as_option().map(str::to_owned),
            last_sequence: 0,
            last_hint: Some(hint.clone()),
            created_at: self.clock.utc(),
        };

        self.run_blocking(move |connection| {
            diesel::insert_into(scope_buckets::table)
                .values(&row)
                .on_conflict(scope_buckets::id)
                .do_update()
                .set(scope_buckets::last_hint.eq(hint))
                .execute(connection)?;
            Ok(())
        })
        .await
    }

    async fn last_hint(
        &self,
        thread_id: ThreadId,
        scope: &Scope,
    ) -> MessageStoreResult<Option<String>> {
        let bucket_id = ScopeBucketId::derive(thread_id, scope);
        self.run_blocking(move |connection| {
            let hint = scope_buckets::table
                .filter(scope_buckets::id.eq(bucket_id.into_inner()))
                .select(scope_buckets::last_hint)
                .first::<Option<String>>(connection)
                .optional()?;
            Ok(hint.flatten())
        })
        .await
    }
}

fn ensure_bucket(
    connection: &mut PgConnection,
    bucket_id: ScopeBucketId,
    thread_id: ThreadId,
    scope: &Scope,
    created_at: chrono::DateTime<chrono::Utc>,
) -> MessageStoreResult<()> {
    let row = NewScopeBucketRow {
        id: bucket_id.into_inner(),
        thread_id: thread_id.into_inner(),
        scope: scope.as_option().map(str::to_owned),
        last_sequence: 0,
        last_hint: None,
        created_at,
    };
    diesel::insert_into(scope_buckets::table)
        .values(&row)
        .on_conflict(scope_buckets::id)
        .do_nothing()
        .execute(connection)?;
    Ok(())
}

fn to_new_row(bucket_id: ScopeBucketId, message: &Message) -> MessageStoreResult<NewMessageRow> {
    let to_json = |value: Result<serde_json::Value, serde_json::Error>| {
        value.map_err(|e| MessageStoreError::serialization(e.to_string()))
    };

    Ok(NewMessageRow {
        id: message.id().into_inner(),
        scope_bucket_id: bucket_id.into_inner(),
        thread_id: message.thread_id().into_inner(),
        scope: message.scope().as_option().map(str::to_owned),
        participant_id: message.participant_id().as_str().to_owned(),
        workflow_type: message.workflow_type().to_string(),
        direction: message.direction().as_str().to_owned(),
        message_type: message.payload().message_type().as_str().to_owned(),
        origin: to_json(serde_json::to_value(message.origin()))?,
        payload: to_json(serde_json::to_value(message.payload()))?,
        metadata: to_json(serde_json::to_value(message.metadata()))?,
        hint: message.hint().map(str::to_owned),
        request_id: message.request_id().map(|id| id.as_str().to_owned()),
        authorization_fingerprint: message.authorization().map(|f| f.as_str().to_owned()),
        created_at: message.created_at(),
        sequence_number: i64::try_from(message.sequence_number().value())
            .map_err(|e| MessageStoreError::serialization(e.to_string()))?,
    })
}

fn row_to_message(row: MessageRow) -> MessageStoreResult<Message> {
    let MessageRow {
        id,
        thread_id,
        scope,
        participant_id,
        workflow_type,
        direction,
        origin,
        payload,
        metadata,
        hint,
        request_id,
        authorization_fingerprint,
        created_at,
        sequence_number,
        ..
    } = row;

    let invalid = |e: &dyn std::fmt::Display| MessageStoreError::serialization(e.to_string());
    let parsed_direction = Direction::parse(&direction)
        .ok_or_else(|| MessageStoreError::serialization(format!("unknown direction '{direction}'")))?;
    let parsed_origin: MessageOrigin = serde_json::from_value(origin).map_err(|e| invalid(&e))?;
    let parsed_payload: MessagePayload = serde_json::from_value(payload).map_err(|e| invalid(&e))?;
    let parsed_metadata: MessageMetadata =
        serde_json::from_value(metadata).map_err(|e| invalid(&e))?;

    Ok(Message::from_persisted(PersistedMessageData {
        id: MessageId::from_uuid(id),
        thread_id: ThreadId::from_uuid(thread_id),
        scope: Scope::parse(scope.as_deref()),
        participant_id: ParticipantId::new(participant_id).map_err(|e| invalid(&e))?,
        workflow_type: WorkflowType::parse(&workflow_type).map_err(|e| invalid(&e))?,
        direction: parsed_direction,
        origin: parsed_origin,
        payload: parsed_payload,
        metadata: parsed_metadata,
        hint,
        request_id: request_id.map(RequestId::new),
        authorization: authorization_fingerprint.map(AuthorizationFingerprint::from_hex),
        created_at,
        sequence_number: SequenceNumber::new(
            u64::try_from(sequence_number).map_err(|e| invalid(&e))?,
        ),
    }))
}

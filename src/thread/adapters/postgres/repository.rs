//! `PostgreSQL` repository implementation for threads.

use super::{
    models::{NewThreadRow, ThreadRow},
    schema::threads,
};
use crate::thread::{
    domain::{PersistedThreadData, Thread, ThreadId, ThreadKey},
    ports::{ThreadInsertOutcome, ThreadRepository, ThreadRepositoryError, ThreadRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};

/// `PostgreSQL` connection pool type used by thread adapters.
pub type ThreadPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed thread repository.
///
/// Uniqueness of the key triple is enforced by the
/// `idx_threads_key` unique index; concurrent inserts use
/// `ON CONFLICT DO NOTHING` and re-read the winner.
#[derive(Debug, Clone)]
pub struct PostgresThreadRepository {
    pool: ThreadPgPool,
}

impl PostgresThreadRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: ThreadPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> ThreadRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> ThreadRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(ThreadRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(ThreadRepositoryError::persistence)?
    }
}

#[async_trait]
impl ThreadRepository for PostgresThreadRepository {
    async fn insert_if_absent(&self, candidate: &Thread) -> ThreadRepositoryResult<ThreadInsertOutcome> {
        let new_row = to_new_row(candidate);
        let stored = candidate.clone();

        self.run_blocking(move |connection| {
            let inserted = diesel::insert_into(threads::table)
                .values(&new_row)
                .on_conflict((
                    threads::tenant_id,
                    threads::workflow_type,
                    threads::participant_id,
                ))
                .do_nothing()
                .execute(connection)
                .map_err(ThreadRepositoryError::persistence)?;

            if inserted == 1 {
                return Ok(ThreadInsertOutcome::Created(stored));
            }

            let winner = find_row_by_key(connection, stored.key())?.ok_or_else(|| {
                ThreadRepositoryError::persistence(std::io::Error::other(
                    "conflicting thread vanished before re-read",
                ))
            })?;
            Ok(ThreadInsertOutcome::Existing(row_to_thread(winner)?))
        })
        .await
    }

    async fn find_by_id(&self, id: ThreadId) -> ThreadRepositoryResult<Option<Thread>> {
        self.run_blocking(move |connection| {
            let row = threads::table
                .filter(threads::id.eq(id.into_inner()))
                .select(ThreadRow::as_select())
                .first::<ThreadRow>(connection)
                .optional()
                .map_err(ThreadRepositoryError::persistence)?;
            row.map(row_to_thread).transpose()
        })
        .await
    }

    async fn find_by_key(&self, key: &ThreadKey) -> ThreadRepositoryResult<Option<Thread>> {
        let wanted = key.clone();
        self.run_blocking(move |connection| {
            find_row_by_key(connection, &wanted)?
                .map(row_to_thread)
                .transpose()
        })
        .await
    }
}

fn find_row_by_key(
    connection: &mut PgConnection,
    key: &ThreadKey,
) -> ThreadRepositoryResult<Option<ThreadRow>> {
    threads::table
        .filter(threads::tenant_id.eq(key.tenant_id().as_str()))
        .filter(threads::workflow_type.eq(key.workflow_type().to_string()))
        .filter(threads::participant_id.eq(key.participant_id().as_str()))
        .select(ThreadRow::as_select())
        .first::<ThreadRow>(connection)
        .optional()
        .map_err(ThreadRepositoryError::persistence)
}

fn to_new_row(thread: &Thread) -> NewThreadRow {
    let key = thread.key();
    NewThreadRow {
        id: thread.id().into_inner(),
        tenant_id: key.tenant_id().as_str().to_owned(),
        workflow_type: key.workflow_type().to_string(),
        participant_id: key.participant_id().as_str().to_owned(),
        created_at: thread.created_at(),
    }
}

fn row_to_thread(row: ThreadRow) -> ThreadRepositoryResult<Thread> {
    let ThreadRow {
        id,
        tenant_id,
        workflow_type,
        participant_id,
        created_at,
    } = row;

    let key = ThreadKey::from_parts(&tenant_id, &workflow_type, &participant_id)
        .map_err(ThreadRepositoryError::invalid_persisted_data)?;
    Ok(Thread::from_persisted(PersistedThreadData {
        id: ThreadId::from_uuid(id),
        key,
        created_at,
    }))
}

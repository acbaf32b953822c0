//! `PostgreSQL` repository implementation for task storage.
//!
//! Terminal transitions are a single conditional `UPDATE ... WHERE state =
//! 'pending' RETURNING *`; the row that comes back is the winner.

use super::{
    models::{NewTaskRow, TaskCompletionChanges, TaskRow},
    schema::tasks,
};
use crate::task::{
    domain::{PersistedTaskData, Task, TaskCompletion, TaskId, TaskOutcome, TaskState},
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult, TaskTransition},
};
use crate::thread::domain::{ParticipantId, Scope, ThreadId};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed task repository.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: TaskPgPool,
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let new_row = to_new_row(task)?;

        self.run_blocking(move |connection| {
            diesel::insert_into(tasks::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TaskRepositoryError::DuplicateTask(task_id)
                    }
                    _ => TaskRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            find_row(connection, id)?.map(row_to_task).transpose()
        })
        .await
    }

    async fn complete(
        &self,
        id: TaskId,
        completion: TaskCompletion,
    ) -> TaskRepositoryResult<TaskTransition> {
        let TaskCompletion { state, outcome } = completion;
        let changes = TaskCompletionChanges {
            state: state.as_str().to_owned(),
            performed_action: outcome.performed_action,
            comment: outcome.comment,
            completed_at: Some(outcome.completed_at),
            updated_at: outcome.completed_at,
        };

        self.run_blocking(move |connection| {
            let pending = tasks::table
                .filter(tasks::id.eq(id.into_inner()))
                .filter(tasks::state.eq(TaskState::Pending.as_str()));
            let updated = diesel::update(pending)
                .set(&changes)
                .returning(TaskRow::as_returning())
                .get_result::<TaskRow>(connection)
                .optional()
                .map_err(TaskRepositoryError::persistence)?;

            if let Some(row) = updated {
                return Ok(TaskTransition::Applied(row_to_task(row)?));
            }
            let current = find_row(connection, id)?.ok_or(TaskRepositoryError::NotFound(id))?;
            Ok(TaskTransition::AlreadyTerminal(row_to_task(current)?))
        })
        .await
    }

    async fn list_pending(&self) -> TaskRepositoryResult<Vec<Task>> {
        self.run_blocking(|connection| {
            tasks::table
                .filter(tasks::state.eq(TaskState::Pending.as_str()))
                .order(tasks::created_at.asc())
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)
                .map_err(TaskRepositoryError::persistence)?
                .into_iter()
                .map(row_to_task)
                .collect()
        })
        .await
    }
}

fn find_row(connection: &mut PgConnection, id: TaskId) -> TaskRepositoryResult<Option<TaskRow>> {
    tasks::table
        .filter(tasks::id.eq(id.into_inner()))
        .select(TaskRow::as_select())
        .first::<TaskRow>(connection)
        .optional()
        .map_err(TaskRepositoryError::persistence)
}

fn to_new_row(task: &Task) -> TaskRepositoryResult<NewTaskRow> {
    let allowed_actions =
        serde_json::to_value(task.allowed_actions()).map_err(TaskRepositoryError::persistence)?;

    Ok(NewTaskRow {
        id: task.id().into_inner(),
        title: task.title().to_owned(),
        description: task.description().to_owned(),
        participant_id: task.participant_id().as_str().to_owned(),
        thread_id: task.thread_id().map(ThreadId::into_inner),
        scope: task.scope().as_option().map(str::to_owned),
        draft: task.draft().clone(),
        allowed_actions,
        deadline: task.deadline(),
        survive_parent_close: task.survives_parent_close(),
        state: task.state().as_str().to_owned(),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    })
}

fn row_to_task(row: TaskRow) -> TaskRepositoryResult<Task> {
    let TaskRow {
        id,
        title,
        description,
        participant_id,
        thread_id,
        scope,
        draft,
        allowed_actions,
        deadline,
        survive_parent_close,
        state: persisted_state,
        performed_action,
        comment,
        completed_at,
        created_at,
        updated_at,
    } = row;

    let state =
        TaskState::try_from(persisted_state.as_str()).map_err(TaskRepositoryError::persistence)?;
    let actions: Vec<String> =
        serde_json::from_value(allowed_actions).map_err(TaskRepositoryError::persistence)?;
    let outcome = completed_at.map(|at| TaskOutcome {
        performed_action,
        comment,
        completed_at: at,
    });

    Ok(Task::from_persisted(PersistedTaskData {
        id: TaskId::from_uuid(id),
        title,
        description,
        participant_id: ParticipantId::new(participant_id)
            .map_err(TaskRepositoryError::persistence)?,
        thread_id: thread_id.map(ThreadId::from_uuid),
        scope: Scope::parse(scope.as_deref()),
        draft,
        allowed_actions: actions,
        deadline,
        survive_parent_close,
        state,
        outcome,
        created_at,
        updated_at,
    }))
}

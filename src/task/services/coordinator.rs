//! Durable wait coordinator for human-in-the-loop tasks.
//!
//! The task record is the checkpoint: waiting workflows re-read it before
//! they suspend, deadlines are persisted as absolute instants and re-armed
//! by [`TaskCoordinator::recover`], and every terminal transition goes
//! through the repository's compare-and-set so that the first of an action,
//! a timeout or an abandonment wins.
//!
//! Completions made by this coordinator wake its waiters at once. A waiter
//! also re-reads the record every poll interval, so completions made by
//! another coordinator over the same repository are picked up too.

use crate::clock::SharedClock;
use crate::delivery::{domain::WorkflowContext, error::DeliveryError, services::DeliveryRouter};
use crate::message::domain::{Message, MessagePayload};
use crate::task::{
    domain::{Task, TaskCompletion, TaskDomainError, TaskHandle, TaskId, TaskRequest, TaskResult, TaskState},
    ports::{TaskRepository, TaskRepositoryError, TaskTransition},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Errors raised by the task coordinator.
#[derive(Debug, Error)]
pub enum TaskCoordinatorError {
    /// The task request is invalid.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// The task repository failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),

    /// No task with this identifier exists.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The action is not one of the task's allowed actions.
    #[error("action '{action}' is not allowed for task {task_id}")]
    InvalidAction {
        /// The task acted upon.
        task_id: TaskId,
        /// The rejected action.
        action: String,
    },

    /// The task already reached a terminal state.
    #[error("task {0} is already completed")]
    AlreadyCompleted(TaskId),

    /// The wait was cancelled before the task completed.
    #[error("wait for task {0} was cancelled")]
    Cancelled(TaskId),

    /// The task was abandoned and has no result.
    #[error("task {0} was abandoned")]
    Abandoned(TaskId),

    /// The task was created but its notification could not be sent.
    #[error("task notification failed: {0}")]
    Notification(Box<DeliveryError>),

    /// Coordinator state could not be accessed.
    #[error("task coordinator state unavailable: {0}")]
    Internal(String),
}

impl From<DeliveryError> for TaskCoordinatorError {
    fn from(err: DeliveryError) -> Self {
        Self::Notification(Box::new(err))
    }
}

impl TaskCoordinatorError {
    fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Result type for coordinator operations.
pub type TaskCoordinatorResult<T> = Result<T, TaskCoordinatorError>;

type Waiters = HashMap<TaskId, watch::Sender<Option<Task>>>;

/// How often a waiting task re-reads its record by default.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Starts, completes and awaits human-in-the-loop tasks.
///
/// Cloning is cheap; clones share timers and waiters.
#[derive(Clone)]
pub struct TaskCoordinator {
    repository: Arc<dyn TaskRepository>,
    clock: SharedClock,
    waiters: Arc<RwLock<Waiters>>,
    timers: Arc<RwLock<HashMap<TaskId, CancellationToken>>>,
    poll_interval: Duration,
}

impl TaskCoordinator {
    /// Creates a coordinator over a task repository.
    #[must_use]
    pub fn new(repository: Arc<dyn TaskRepository>, clock: SharedClock) -> Self {
        Self {
            repository,
            clock,
            waiters: Arc::new(RwLock::new(HashMap::new())),
            timers: Arc::new(RwLock::new(HashMap::new())),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Sets how often waiters re-read their task record.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Persists a new pending task and arms its deadline.
    ///
    /// The returned handle is detached: nothing waits for the task until
    /// [`Self::await_result`] is called with it.
    ///
    /// # Errors
    ///
    /// Returns [`TaskCoordinatorError::Domain`] for an invalid request and
    /// [`TaskCoordinatorError::Repository`] when the task cannot be stored.
    pub async fn start(&self, request: TaskRequest) -> TaskCoordinatorResult<TaskHandle> {
        let task = Task::new(request, &*self.clock)?;
        self.repository.store(&task).await?;
        if let Some(deadline) = task.deadline() {
            self.arm_timer(task.id(), deadline)?;
        }
        info!(
            task_id = %task.id(),
            participant_id = %task.participant_id(),
            deadline = ?task.deadline(),
            "task started"
        );
        Ok(TaskHandle::new(task.id()))
    }

    /// Starts a task and announces it to its participant.
    ///
    /// The notification is sent in the caller's workflow thread and the
    /// request's scope with the task id as hint, which links the task to the
    /// conversation.
    ///
    /// # Errors
    ///
    /// As for [`Self::start`], plus [`TaskCoordinatorError::Notification`]
    /// when the notification cannot be delivered. The task stays pending in
    /// that case.
    pub async fn create_with_notification(
        &self,
        router: &DeliveryRouter,
        ctx: &WorkflowContext,
        request: TaskRequest,
        notification: impl Into<String> + Send,
    ) -> TaskCoordinatorResult<(TaskHandle, Message)> {
        let participant = request.participant_id().as_str().to_owned();
        let scope = request.scope().clone();
        let thread = router
            .resolve_thread(ctx.caller(), ctx.workflow_type(), &participant)
            .await?;

        let handle = self
            .start(request.linked_to(thread.id(), scope.clone()))
            .await?;
        let message = router
            .send_payload(
                ctx,
                &participant,
                scope,
                MessagePayload::chat(notification),
                Some(handle.task_id().to_string()),
            )
            .await?;
        Ok((handle, message))
    }

    /// Completes a pending task with a human action.
    ///
    /// # Errors
    ///
    /// Returns [`TaskCoordinatorError::NotFound`] for unknown tasks,
    /// [`TaskCoordinatorError::AlreadyCompleted`] when the task is terminal
    /// (including when a concurrent timeout wins) and
    /// [`TaskCoordinatorError::InvalidAction`] when the action is not allowed.
    pub async fn perform_action(
        &self,
        task_id: TaskId,
        action: &str,
        comment: Option<String>,
    ) -> TaskCoordinatorResult<Task> {
        let task = self.load(task_id).await?;
        if task.state().is_terminal() {
            return Err(TaskCoordinatorError::AlreadyCompleted(task_id));
        }
        if !task.allows(action) {
            return Err(TaskCoordinatorError::InvalidAction {
                task_id,
                action: action.to_owned(),
            });
        }

        let completion = TaskCompletion::by_action(action.trim(), comment, &*self.clock);
        match self.repository.complete(task_id, completion).await? {
            TaskTransition::Applied(completed) => {
                self.finish(&completed)?;
                info!(task_id = %task_id, action = action.trim(), "task completed by action");
                Ok(completed)
            }
            TaskTransition::AlreadyTerminal(_) => Err(TaskCoordinatorError::AlreadyCompleted(task_id)),
        }
    }

    /// Waits for a task to finish.
    ///
    /// Returns at once when the task is already terminal. Other work keeps
    /// running while this waits.
    ///
    /// # Errors
    ///
    /// Returns [`TaskCoordinatorError::Cancelled`] when `cancel` fires first,
    /// [`TaskCoordinatorError::Abandoned`] for abandoned tasks and
    /// [`TaskCoordinatorError::NotFound`] for unknown tasks.
    pub async fn await_result(
        &self,
        handle: TaskHandle,
        cancel: &CancellationToken,
    ) -> TaskCoordinatorResult<TaskResult> {
        let task_id = handle.task_id();
        let mut receiver = self.subscribe(task_id)?;
        let current = match self.load(task_id).await {
            Ok(task) => task,
            Err(err) => {
                drop(receiver);
                self.forget_waiter(task_id)?;
                return Err(err);
            }
        };
        if current.state().is_terminal() {
            drop(receiver);
            self.forget_waiter(task_id)?;
            return result_of(&current);
        }

        let finished = tokio::select! {
            () = cancel.cancelled() => None,
            changed = receiver.wait_for(Option::is_some) => Some(
                changed
                    .map_err(TaskCoordinatorError::internal)?
                    .clone()
                    .ok_or_else(|| TaskCoordinatorError::internal("task watcher closed empty"))?,
            ),
            polled = self.poll_until_terminal(task_id) => Some(polled?),
        };
        drop(receiver);

        let Some(task) = finished else {
            self.forget_waiter(task_id)?;
            debug!(task_id = %task_id, "task wait cancelled");
            return Err(TaskCoordinatorError::Cancelled(task_id));
        };
        result_of(&task)
    }

    /// Applies the cancellation of a task's parent workflow.
    ///
    /// A task that does not survive its parent is abandoned; one that does
    /// stays pending. Returns the task's state afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`TaskCoordinatorError::NotFound`] for unknown tasks.
    pub async fn cancel_parent(&self, task_id: TaskId) -> TaskCoordinatorResult<TaskState> {
        let task = self.load(task_id).await?;
        if task.state().is_terminal() {
            return Ok(task.state());
        }
        if task.survives_parent_close() {
            info!(task_id = %task_id, "parent closed, task keeps waiting");
            return Ok(TaskState::Pending);
        }

        let completion = TaskCompletion::abandoned(&*self.clock);
        match self.repository.complete(task_id, completion).await? {
            TaskTransition::Applied(abandoned) => {
                self.finish(&abandoned)?;
                info!(task_id = %task_id, "task abandoned with its parent");
                Ok(abandoned.state())
            }
            TaskTransition::AlreadyTerminal(current) => Ok(current.state()),
        }
    }

    /// Re-arms the deadlines of all pending tasks after a restart.
    ///
    /// Deadlines already in the past fire immediately. Returns the number
    /// of timers armed.
    ///
    /// # Errors
    ///
    /// Returns [`TaskCoordinatorError::Repository`] when pending tasks cannot
    /// be listed.
    pub async fn recover(&self) -> TaskCoordinatorResult<usize> {
        let pending = self.repository.list_pending().await?;
        let mut armed = 0_usize;
        for task in &pending {
            if let Some(deadline) = task.deadline() {
                self.arm_timer(task.id(), deadline)?;
                armed = armed.saturating_add(1);
            }
        }
        info!(pending = pending.len(), armed, "task timers recovered");
        Ok(armed)
    }

    /// Returns `true` when a task with this identifier exists.
    ///
    /// # Errors
    ///
    /// Returns [`TaskCoordinatorError::Repository`] when the lookup fails.
    pub async fn exists(&self, task_id: TaskId) -> TaskCoordinatorResult<bool> {
        Ok(self.repository.find_by_id(task_id).await?.is_some())
    }

    /// Returns the current task record.
    ///
    /// # Errors
    ///
    /// Returns [`TaskCoordinatorError::Repository`] when the lookup fails.
    pub async fn get(&self, task_id: TaskId) -> TaskCoordinatorResult<Option<Task>> {
        Ok(self.repository.find_by_id(task_id).await?)
    }

    async fn load(&self, task_id: TaskId) -> TaskCoordinatorResult<Task> {
        self.repository
            .find_by_id(task_id)
            .await?
            .ok_or(TaskCoordinatorError::NotFound(task_id))
    }

    fn arm_timer(&self, task_id: TaskId, deadline: DateTime<Utc>) -> TaskCoordinatorResult<()> {
        let wait = (deadline - self.clock.utc())
            .to_std()
            .unwrap_or(Duration::ZERO);
        let token = CancellationToken::new();
        let previous = self
            .timers
            .write()
            .map_err(TaskCoordinatorError::internal)?
            .insert(task_id, token.clone());
        if let Some(stale) = previous {
            stale.cancel();
        }

        let coordinator = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {}
                () = tokio::time::sleep(wait) => coordinator.expire(task_id).await,
            }
        });
        Ok(())
    }

    async fn expire(&self, task_id: TaskId) {
        let completion = TaskCompletion::by_timeout(&*self.clock);
        match self.repository.complete(task_id, completion).await {
            Ok(TaskTransition::Applied(expired)) => {
                if let Err(err) = self.finish(&expired) {
                    error!(task_id = %task_id, error = %err, "failed to publish task timeout");
                }
                info!(task_id = %task_id, "task completed by timeout");
            }
            Ok(TaskTransition::AlreadyTerminal(_)) => {
                debug!(task_id = %task_id, "deadline passed after task completed");
            }
            Err(err) => {
                error!(task_id = %task_id, error = %err, "failed to time out task");
            }
        }
    }

    /// Disarms the timer and wakes everyone waiting on `task`.
    fn finish(&self, task: &Task) -> TaskCoordinatorResult<()> {
        let timer = self
            .timers
            .write()
            .map_err(TaskCoordinatorError::internal)?
            .remove(&task.id());
        if let Some(token) = timer {
            token.cancel();
        }
        let waiter = self
            .waiters
            .write()
            .map_err(TaskCoordinatorError::internal)?
            .remove(&task.id());
        if let Some(sender) = waiter {
            sender.send_replace(Some(task.clone()));
        }
        Ok(())
    }

    async fn poll_until_terminal(&self, task_id: TaskId) -> TaskCoordinatorResult<Task> {
        let mut ticker = tokio::time::interval(self.poll_interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let task = self.load(task_id).await?;
            if task.state().is_terminal() {
                debug!(task_id = %task_id, state = ?task.state(), "task completed elsewhere");
                self.finish(&task)?;
                return Ok(task);
            }
        }
    }

    fn subscribe(&self, task_id: TaskId) -> TaskCoordinatorResult<watch::Receiver<Option<Task>>> {
        let mut waiters = self.waiters.write().map_err(TaskCoordinatorError::internal)?;
        Ok(waiters
            .entry(task_id)
            .or_insert_with(|| watch::channel(None).0)
            .subscribe())
    }

    fn forget_waiter(&self, task_id: TaskId) -> TaskCoordinatorResult<()> {
        let mut waiters = self.waiters.write().map_err(TaskCoordinatorError::internal)?;
        if waiters
            .get(&task_id)
            .is_some_and(|sender| sender.receiver_count() == 0)
        {
            waiters.remove(&task_id);
        }
        Ok(())
    }
}

fn result_of(task: &Task) -> TaskCoordinatorResult<TaskResult> {
    task.result()
        .ok_or(TaskCoordinatorError::Abandoned(task.id()))
}

//! Thread registry: resolves identity triples to threads.

use crate::clock::SharedClock;
use crate::tenancy::{
    domain::CallerIdentity,
    ports::{WorkflowRegistry, WorkflowRegistryError},
};
use crate::thread::{
    domain::{Thread, ThreadDomainError, ThreadId, ThreadKey},
    ports::{ThreadInsertOutcome, ThreadRepository, ThreadRepositoryError},
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised by the thread registry.
#[derive(Debug, Error)]
pub enum ThreadRegistryError {
    /// A key part is empty or malformed.
    #[error(transparent)]
    InvalidKey(#[from] ThreadDomainError),

    /// The caller is authenticated as a different tenant.
    #[error("caller tenant '{caller}' may not access tenant '{requested}'")]
    TenantMismatch {
        /// The authenticated tenant.
        caller: String,
        /// The tenant named in the request.
        requested: String,
    },

    /// The workflow type is not registered or not visible to the tenant.
    #[error("workflow not found: {0}")]
    WorkflowNotFound(String),

    /// The workflow registry failed.
    #[error(transparent)]
    Registry(#[from] WorkflowRegistryError),

    /// The thread repository failed.
    #[error(transparent)]
    Repository(#[from] ThreadRepositoryError),
}

/// Result type for thread registry operations.
pub type ThreadRegistryResult<T> = Result<T, ThreadRegistryError>;

/// Resolves (tenant, workflow, participant) triples to threads.
#[derive(Clone)]
pub struct ThreadRegistryService {
    repository: Arc<dyn ThreadRepository>,
    workflows: Arc<dyn WorkflowRegistry>,
    clock: SharedClock,
}

impl ThreadRegistryService {
    /// Creates a new thread registry service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn ThreadRepository>,
        workflows: Arc<dyn WorkflowRegistry>,
        clock: SharedClock,
    ) -> Self {
        Self {
            repository,
            workflows,
            clock,
        }
    }

    /// Returns the thread for the given triple, creating it on first use.
    ///
    /// Repeated and concurrent calls for the same triple return the same
    /// thread.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadRegistryError::InvalidKey`] for an empty or malformed
    /// part, [`ThreadRegistryError::TenantMismatch`] when `caller` is not
    /// authenticated as `tenant_id`, and
    /// [`ThreadRegistryError::WorkflowNotFound`] when the workflow type is
    /// not registered for the tenant.
    pub async fn resolve_or_create(
        &self,
        caller: &CallerIdentity,
        tenant_id: &str,
        workflow_type: &str,
        participant_id: &str,
    ) -> ThreadRegistryResult<Thread> {
        let key = ThreadKey::from_parts(tenant_id, workflow_type, participant_id)?;
        self.resolve_key(caller, key).await
    }

    /// Returns the thread for an already validated key.
    ///
    /// # Errors
    ///
    /// As for [`Self::resolve_or_create`], minus key validation.
    pub async fn resolve_key(
        &self,
        caller: &CallerIdentity,
        key: ThreadKey,
    ) -> ThreadRegistryResult<Thread> {
        if !caller.owns(key.tenant_id()) {
            return Err(ThreadRegistryError::TenantMismatch {
                caller: caller.tenant_id().to_string(),
                requested: key.tenant_id().to_string(),
            });
        }

        if self
            .workflows
            .find_workflow(key.tenant_id(), key.workflow_type())
            .await?
            .is_none()
        {
            return Err(ThreadRegistryError::WorkflowNotFound(
                key.workflow_type().to_string(),
            ));
        }

        if let Some(existing) = self.repository.find_by_key(&key).await? {
            return Ok(existing);
        }

        let candidate = Thread::new(key, &*self.clock);
        match self.repository.insert_if_absent(&candidate).await? {
            ThreadInsertOutcome::Created(thread) => {
                info!(
                    thread_id = %thread.id(),
                    tenant_id = %thread.key().tenant_id(),
                    workflow_type = %thread.key().workflow_type(),
                    participant_id = %thread.key().participant_id(),
                    "thread created"
                );
                Ok(thread)
            }
            ThreadInsertOutcome::Existing(thread) => {
                debug!(thread_id = %thread.id(), "lost thread creation race");
                Ok(thread)
            }
        }
    }

    /// Returns a thread by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadRegistryError::Repository`] when the lookup fails.
    pub async fn get(&self, thread_id: ThreadId) -> ThreadRegistryResult<Option<Thread>> {
        Ok(self.repository.find_by_id(thread_id).await?)
    }

    /// Returns a thread by identifier on behalf of `caller`.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadRegistryError::TenantMismatch`] when the thread
    /// belongs to another tenant.
    pub async fn get_for(
        &self,
        caller: &CallerIdentity,
        thread_id: ThreadId,
    ) -> ThreadRegistryResult<Option<Thread>> {
        match self.repository.find_by_id(thread_id).await? {
            Some(thread) if !caller.owns(thread.key().tenant_id()) => {
                Err(ThreadRegistryError::TenantMismatch {
                    caller: caller.tenant_id().to_string(),
                    requested: thread.key().tenant_id().to_string(),
                })
            }
            found => Ok(found),
        }
    }
}

//! Error types for message delivery.

use crate::delivery::domain::AdminRequestError;
use crate::message::{
    domain::{MessageId, RequestId},
    services::{HintOverlayError, ScopeIndexError},
};
use crate::tenancy::domain::WorkflowType;
use crate::tenancy::services::AgentRegistryServiceError;
use crate::thread::services::ThreadRegistryError;
use thiserror::Error;

/// Errors raised by the delivery router and the services built on it.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Thread resolution failed: invalid key, tenant mismatch or unknown
    /// workflow.
    #[error(transparent)]
    Thread(#[from] ThreadRegistryError),

    /// Placement or history lookup failed, including draft validation.
    #[error(transparent)]
    Index(#[from] ScopeIndexError),

    /// The hint register could not be read or written.
    #[error(transparent)]
    Hint(#[from] HintOverlayError),

    /// The workflow registry failed.
    #[error(transparent)]
    Registry(AgentRegistryServiceError),

    /// A workflow could not be resolved, or a short name was ambiguous.
    #[error("workflow not found: {0}")]
    WorkflowNotFound(String),

    /// No handler is registered for the workflow type.
    #[error("no handler registered for workflow {0}")]
    HandlerNotRegistered(WorkflowType),

    /// A webhook request already received its response.
    #[error("webhook request {request_id} already has a response")]
    DuplicateResponse {
        /// The request that was answered twice.
        request_id: RequestId,
    },

    /// No webhook request with this identifier is open.
    #[error("no open webhook request {0}")]
    UnknownRequest(RequestId),

    /// The message was stored but could not be transmitted.
    #[error("message {message_id} was stored but not delivered: {reason}")]
    Transmission {
        /// The stored message.
        message_id: MessageId,
        /// Last transport error.
        reason: String,
    },

    /// An agent-to-agent call received no reply in time.
    #[error("no reply to request {request_id} within the timeout")]
    ReplyTimeout {
        /// The outstanding request.
        request_id: RequestId,
    },

    /// An agent-to-agent call was abandoned before a reply arrived.
    #[error("request {request_id} was abandoned before a reply arrived")]
    ReplyAbandoned {
        /// The outstanding request.
        request_id: RequestId,
    },

    /// The operation needs a message that carries a request identifier.
    #[error("message {0} carries no request id")]
    MissingRequestId(MessageId),

    /// An admin request could not be converted to a payload.
    #[error(transparent)]
    InvalidRequest(#[from] AdminRequestError),

    /// Internal state could not be accessed.
    #[error("delivery state unavailable: {0}")]
    Internal(String),
}

impl From<AgentRegistryServiceError> for DeliveryError {
    fn from(err: AgentRegistryServiceError) -> Self {
        match err {
            AgentRegistryServiceError::WorkflowNotFound(name) => Self::WorkflowNotFound(name),
            AgentRegistryServiceError::AmbiguousWorkflow { agent, name } => {
                Self::WorkflowNotFound(format!("{agent}:{name} is ambiguous"))
            }
            other => Self::Registry(other),
        }
    }
}

impl DeliveryError {
    pub(crate) fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Result type for delivery operations.
pub type DeliveryResult<T> = Result<T, DeliveryError>;

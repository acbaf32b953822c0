//! Inbound events and the receipt returned once they are stored.

use super::WorkflowContext;
use crate::message::domain::{Message, MessageMetadata, MessageOrigin, MessagePayload, RequestId};
use crate::thread::domain::{Scope, ScopeBucketId, Thread};

/// An event entering the engine: a chat, data, file, webhook or A2A call.
///
/// Key parts are kept as received so that validation failures surface as
/// [`crate::thread::domain::ThreadDomainError`] at the point of
/// resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    /// Tenant addressed by the event.
    pub tenant_id: String,
    /// Composite workflow type `Agent:Workflow`.
    pub workflow_type: String,
    /// Participant sending the event.
    pub participant_id: String,
    /// Scope bucket; null unless given.
    pub scope: Scope,
    /// Typed body.
    pub payload: MessagePayload,
    /// Free-form metadata.
    pub metadata: MessageMetadata,
    /// Optional hint.
    pub hint: Option<String>,
    /// Optional correlation identifier.
    pub request_id: Option<RequestId>,
    /// Optional cleartext authorization token, fingerprinted on storage.
    pub authorization: Option<String>,
    /// Producer of the event.
    pub origin: MessageOrigin,
}

impl InboundEvent {
    /// Creates an event from a participant with the null scope.
    #[must_use]
    pub fn new(
        tenant_id: impl Into<String>,
        workflow_type: impl Into<String>,
        participant_id: impl Into<String>,
        payload: MessagePayload,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            workflow_type: workflow_type.into(),
            participant_id: participant_id.into(),
            scope: Scope::null(),
            payload,
            metadata: MessageMetadata::empty(),
            hint: None,
            request_id: None,
            authorization: None,
            origin: MessageOrigin::User,
        }
    }

    /// Creates a chat event.
    #[must_use]
    pub fn chat(
        tenant_id: impl Into<String>,
        workflow_type: impl Into<String>,
        participant_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self::new(
            tenant_id,
            workflow_type,
            participant_id,
            MessagePayload::chat(text),
        )
    }

    /// Places the event in a scope.
    #[must_use]
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Attaches metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: MessageMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Attaches a hint.
    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Attaches a correlation identifier.
    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Attaches an authorization token.
    #[must_use]
    pub fn with_authorization(mut self, token: impl Into<String>) -> Self {
        self.authorization = Some(token.into());
        self
    }

    /// Overrides the producer.
    #[must_use]
    pub fn with_origin(mut self, origin: MessageOrigin) -> Self {
        self.origin = origin;
        self
    }
}

/// Result of storing an inbound event.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundReceipt {
    /// Context of the addressed workflow.
    pub context: WorkflowContext,
    /// Thread the event was stored in.
    pub thread: Thread,
    /// Bucket the event was stored in.
    pub bucket_id: ScopeBucketId,
    /// The stored incoming message.
    pub message: Message,
}

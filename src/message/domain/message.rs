//! The Message aggregate and the draft used to append one.
//!
//! Messages are immutable once written. A [`MessageDraft`] carries
//! everything the caller decides; the store adds the identifier, the
//! (thread, scope) placement, the sequence number and the timestamp.

use super::{
    AuthorizationFingerprint, MessageId, MessageMetadata, MessagePayload, RequestId,
    SequenceNumber,
};
use crate::tenancy::domain::WorkflowType;
use crate::thread::domain::{ParticipantId, Scope, ThreadId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a message entered or left the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Sent by a participant, a webhook caller or another workflow.
    Incoming,
    /// Sent by a workflow.
    Outgoing,
}

impl Direction {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Incoming => "incoming",
            Self::Outgoing => "outgoing",
        }
    }

    /// Parses the storage representation.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "incoming" => Some(Self::Incoming),
            "outgoing" => Some(Self::Outgoing),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who produced a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessageOrigin {
    /// The participant of the thread.
    User,
    /// A workflow, either replying in its own thread or acting in another
    /// workflow's thread (A2A, impersonation).
    Workflow {
        /// The workflow that actually sent the message.
        workflow_type: WorkflowType,
    },
    /// The admin messaging API.
    Admin,
    /// An inbound webhook call.
    Webhook,
}

/// A message within a (thread, scope) bucket.
///
/// # Examples
///
/// ```
/// use parley::message::domain::{Direction, Message, MessageDraft, MessagePayload, SequenceNumber};
/// use parley::tenancy::domain::WorkflowType;
/// use parley::thread::domain::{ParticipantId, Scope, ThreadId};
/// use mockable::DefaultClock;
///
/// let draft = MessageDraft::incoming(
///     ParticipantId::new("u1").expect("valid participant"),
///     WorkflowType::parse("Support:Chat").expect("valid type"),
///     MessagePayload::chat("Hi"),
/// );
/// let message = Message::from_draft(
///     ThreadId::new(),
///     Scope::null(),
///     draft,
///     SequenceNumber::first(),
///     &DefaultClock,
/// );
///
/// assert_eq!(message.direction(), Direction::Incoming);
/// assert_eq!(message.payload().text(), Some("Hi"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    thread_id: ThreadId,
    scope: Scope,
    participant_id: ParticipantId,
    workflow_type: WorkflowType,
    direction: Direction,
    origin: MessageOrigin,
    payload: MessagePayload,
    metadata: MessageMetadata,
    hint: Option<String>,
    request_id: Option<RequestId>,
    authorization: Option<AuthorizationFingerprint>,
    created_at: DateTime<Utc>,
    sequence_number: SequenceNumber,
}

/// Parameter object for reconstructing a persisted message.
#[derive(Debug, Clone)]
pub struct PersistedMessageData {
    /// Message identifier.
    pub id: MessageId,
    /// Owning thread.
    pub thread_id: ThreadId,
    /// Scope bucket within the thread.
    pub scope: Scope,
    /// Thread participant.
    pub participant_id: ParticipantId,
    /// Workflow type of the thread.
    pub workflow_type: WorkflowType,
    /// Incoming or outgoing.
    pub direction: Direction,
    /// Producer of the message.
    pub origin: MessageOrigin,
    /// Typed body.
    pub payload: MessagePayload,
    /// Free-form metadata.
    pub metadata: MessageMetadata,
    /// Optional hint.
    pub hint: Option<String>,
    /// Optional correlation identifier.
    pub request_id: Option<RequestId>,
    /// Optional fingerprint of the authorization token.
    pub authorization: Option<AuthorizationFingerprint>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Position within the bucket.
    pub sequence_number: SequenceNumber,
}

impl Message {
    /// Materialises a draft at the given bucket position.
    #[must_use]
    pub fn from_draft(
        thread_id: ThreadId,
        scope: Scope,
        draft: MessageDraft,
        sequence_number: SequenceNumber,
        clock: &(impl Clock + ?Sized),
    ) -> Self {
        let MessageDraft {
            participant_id,
            workflow_type,
            direction,
            origin,
            payload,
            metadata,
            hint,
            request_id,
            authorization,
        } = draft;

        Self {
            id: MessageId::new(),
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
            authorization,
            created_at: clock.utc(),
            sequence_number,
        }
    }

    /// Reconstructs a message from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedMessageData) -> Self {
        Self {
            id: data.id,
            thread_id: data.thread_id,
            scope: data.scope,
            participant_id: data.participant_id,
            workflow_type: data.workflow_type,
            direction: data.direction,
            origin: data.origin,
            payload: data.payload,
            metadata: data.metadata,
            hint: data.hint,
            request_id: data.request_id,
            authorization: data.authorization,
            created_at: data.created_at,
            sequence_number: data.sequence_number,
        }
    }

    /// Returns the message identifier.
    #[must_use]
    pub const fn id(&self) -> MessageId {
        self.id
    }

    /// Returns the owning thread.
    #[must_use]
    pub const fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    /// Returns the scope bucket.
    #[must_use]
    pub const fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Returns the thread participant.
    #[must_use]
    pub const fn participant_id(&self) -> &ParticipantId {
        &self.participant_id
    }

    /// Returns the workflow type of the thread.
    #[must_use]
    pub const fn workflow_type(&self) -> &WorkflowType {
        &self.workflow_type
    }

    /// Returns the direction.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns the producer of the message.
    #[must_use]
    pub const fn origin(&self) -> &MessageOrigin {
        &self.origin
    }

    /// Returns the typed body.
    #[must_use]
    pub const fn payload(&self) -> &MessagePayload {
        &self.payload
    }

    /// Returns the metadata.
    #[must_use]
    pub const fn metadata(&self) -> &MessageMetadata {
        &self.metadata
    }

    /// Returns the hint, if any.
    #[must_use]
    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    /// Returns the correlation identifier, if any.
    #[must_use]
    pub const fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    /// Returns the authorization fingerprint, if any.
    #[must_use]
    pub const fn authorization(&self) -> Option<&AuthorizationFingerprint> {
        self.authorization.as_ref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the position within the bucket.
    #[must_use]
    pub const fn sequence_number(&self) -> SequenceNumber {
        self.sequence_number
    }
}

/// A message that has not been placed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    participant_id: ParticipantId,
    workflow_type: WorkflowType,
    direction: Direction,
    origin: MessageOrigin,
    payload: MessagePayload,
    metadata: MessageMetadata,
    hint: Option<String>,
    request_id: Option<RequestId>,
    authorization: Option<AuthorizationFingerprint>,
}

impl MessageDraft {
    /// Creates a draft for a message sent by the participant.
    #[must_use]
    pub fn incoming(
        participant_id: ParticipantId,
        workflow_type: WorkflowType,
        payload: MessagePayload,
    ) -> Self {
        Self::with_direction(
            participant_id,
            workflow_type,
            Direction::Incoming,
            MessageOrigin::User,
            payload,
        )
    }

    /// Creates a draft for a message sent by the thread's own workflow.
    #[must_use]
    pub fn outgoing(
        participant_id: ParticipantId,
        workflow_type: WorkflowType,
        payload: MessagePayload,
    ) -> Self {
        let origin = MessageOrigin::Workflow {
            workflow_type: workflow_type.clone(),
        };
        Self::with_direction(
            participant_id,
            workflow_type,
            Direction::Outgoing,
            origin,
            payload,
        )
    }

    fn with_direction(
        participant_id: ParticipantId,
        workflow_type: WorkflowType,
        direction: Direction,
        origin: MessageOrigin,
        payload: MessagePayload,
    ) -> Self {
        Self {
            participant_id,
            workflow_type,
            direction,
            origin,
            payload,
            metadata: MessageMetadata::empty(),
            hint: None,
            request_id: None,
            authorization: None,
        }
    }

    /// Overrides the recorded producer.
    #[must_use]
    pub fn with_origin(mut self, origin: MessageOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// Attaches metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: MessageMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Attaches a hint; blank hints are ignored.
    #[must_use]
    pub fn with_hint(mut self, hint: Option<String>) -> Self {
        self.hint = hint.filter(|value| !value.trim().is_empty());
        self
    }

    /// Attaches a correlation identifier.
    #[must_use]
    pub fn with_request_id(mut self, request_id: Option<RequestId>) -> Self {
        self.request_id = request_id;
        self
    }

    /// Records the fingerprint of an authorization token.
    #[must_use]
    pub fn with_authorization_token(mut self, token: Option<&str>) -> Self {
        self.authorization = token.map(AuthorizationFingerprint::of_token);
        self
    }

    /// Records an already computed fingerprint.
    #[must_use]
    pub fn with_authorization(mut self, fingerprint: Option<AuthorizationFingerprint>) -> Self {
        self.authorization = fingerprint;
        self
    }

    /// Returns the participant.
    #[must_use]
    pub const fn participant_id(&self) -> &ParticipantId {
        &self.participant_id
    }

    /// Returns the workflow type.
    #[must_use]
    pub const fn workflow_type(&self) -> &WorkflowType {
        &self.workflow_type
    }

    /// Returns the direction.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns the payload.
    #[must_use]
    pub const fn payload(&self) -> &MessagePayload {
        &self.payload
    }

    /// Returns the metadata.
    #[must_use]
    pub const fn metadata(&self) -> &MessageMetadata {
        &self.metadata
    }

    /// Returns the hint, if any.
    #[must_use]
    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    /// Returns the correlation identifier, if any.
    #[must_use]
    pub const fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }
}

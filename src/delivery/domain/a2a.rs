//! Agent-to-agent call requests.

use crate::message::domain::MessagePayload;
use crate::tenancy::domain::WorkflowType;
use crate::thread::domain::Scope;

/// A message sent by one workflow to another.
///
/// The call is recorded as an incoming message in the target's thread for
/// `participant_id`. When `expect_reply` is set the sender waits for the
/// target's correlated reply.
#[derive(Debug, Clone, PartialEq)]
pub struct A2aRequest {
    /// Workflow receiving the call.
    pub target_workflow: WorkflowType,
    /// Participant whose thread carries the call.
    pub participant_id: String,
    /// Scope of the call; null unless given.
    pub scope: Scope,
    /// Body of the call.
    pub payload: MessagePayload,
    /// Whether the sender waits for a reply.
    pub expect_reply: bool,
}

impl A2aRequest {
    /// Creates a call that waits for a reply.
    #[must_use]
    pub fn request(
        target_workflow: WorkflowType,
        participant_id: impl Into<String>,
        payload: MessagePayload,
    ) -> Self {
        Self {
            target_workflow,
            participant_id: participant_id.into(),
            scope: Scope::null(),
            payload,
            expect_reply: true,
        }
    }

    /// Creates a fire-and-forget call.
    #[must_use]
    pub fn notify(
        target_workflow: WorkflowType,
        participant_id: impl Into<String>,
        payload: MessagePayload,
    ) -> Self {
        Self {
            expect_reply: false,
            ..Self::request(target_workflow, participant_id, payload)
        }
    }

    /// Places the call in a scope.
    #[must_use]
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }
}

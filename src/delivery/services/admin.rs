//! Admin messaging: operator-initiated sends into a tenant's threads.

use super::DeliveryRouter;
use crate::delivery::{domain::AdminSendRequest, error::DeliveryResult};
use crate::message::domain::{Message, MessageDraft, MessageOrigin, RequestId};
use crate::tenancy::{
    domain::{AgentName, CallerIdentity},
    services::AgentRegistryServiceError,
};
use crate::thread::{
    domain::{Scope, ThreadKey},
    services::ThreadRegistryError,
};
use tracing::info;

/// Sends messages on behalf of an operator.
///
/// The sending workflow is named by agent and activation name; the message
/// is stored as outgoing in that workflow's thread for the participant and
/// then delivered like any other outbound message.
#[derive(Clone)]
pub struct AdminMessagingService {
    router: DeliveryRouter,
}

impl AdminMessagingService {
    /// Creates the service over a router.
    #[must_use]
    pub const fn new(router: DeliveryRouter) -> Self {
        Self { router }
    }

    /// Sends the message described by `request` within `tenant_id`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::delivery::error::DeliveryError::Thread`] for an
    /// invalid key or a foreign tenant,
    /// [`crate::delivery::error::DeliveryError::WorkflowNotFound`] when the
    /// activation name does not resolve,
    /// [`crate::delivery::error::DeliveryError::InvalidRequest`] for a
    /// malformed payload, plus the errors of delivery.
    pub async fn send(
        &self,
        caller: &CallerIdentity,
        tenant_id: &str,
        request: AdminSendRequest,
    ) -> DeliveryResult<Message> {
        let agent = AgentName::new(request.agent_name.as_str())
            .map_err(AgentRegistryServiceError::from)?;
        let requested_key = ThreadKey::from_parts(
            tenant_id,
            &format!("{}:{}", agent, request.activation_name.trim()),
            &request.participant_id,
        )
        .map_err(ThreadRegistryError::from)?;
        if !caller.owns(requested_key.tenant_id()) {
            return Err(ThreadRegistryError::TenantMismatch {
                caller: caller.tenant_id().to_string(),
                requested: requested_key.tenant_id().to_string(),
            }
            .into());
        }

        let workflow = self
            .router
            .agents()
            .resolve_by_name(requested_key.tenant_id(), &agent, &request.activation_name)
            .await?;
        let payload = request.payload()?;
        let thread = self
            .router
            .resolve_thread(caller, &workflow.workflow_type, &request.participant_id)
            .await?;

        let AdminSendRequest {
            scope,
            hint,
            request_id,
            authorization,
            ..
        } = request;
        let draft = MessageDraft::outgoing(
            thread.key().participant_id().clone(),
            workflow.workflow_type.clone(),
            payload,
        )
        .with_origin(MessageOrigin::Admin)
        .with_hint(hint)
        .with_request_id(request_id.map(RequestId::new))
        .with_authorization_token(authorization.as_deref());

        let message = self
            .router
            .deliver(thread.id(), &Scope::parse(scope.as_deref()), draft)
            .await?;
        info!(
            tenant_id = %thread.key().tenant_id(),
            workflow_type = %workflow.workflow_type,
            message_id = %message.id(),
            message_type = %message.payload().message_type(),
            "admin message sent"
        );
        Ok(message)
    }
}

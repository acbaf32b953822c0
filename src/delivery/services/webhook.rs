//! Inbound webhook surface.
//!
//! A webhook call is stored as an incoming webhook message, dispatched to
//! the workflow's handler in the background, and held open until the
//! handler answers through [`DeliveryRouter::send_webhook_response`] or
//! the effective timeout passes. A call that times out is closed: its
//! `504` is stored in the ledger and a late handler response is rejected.

use super::DeliveryRouter;
use crate::config::WebhookConfig;
use crate::delivery::{
    domain::{InboundEvent, WebhookInvocation, WebhookResponse},
    error::{DeliveryError, DeliveryResult},
};
use crate::message::{
    domain::{MessageOrigin, MessagePayload, RequestId, WebhookPayload},
    services::ScopeIndexError,
};
use crate::tenancy::domain::CallerIdentity;
use crate::thread::{
    domain::{Scope, ThreadKey},
    services::ThreadRegistryError,
};
use serde_json::{Value, json};
use tracing::{info, warn};

/// Accepts webhook calls on behalf of built-in workflows.
#[derive(Clone)]
pub struct WebhookService {
    router: DeliveryRouter,
    config: WebhookConfig,
}

impl WebhookService {
    /// Creates a webhook service over a router.
    #[must_use]
    pub const fn new(router: DeliveryRouter, config: WebhookConfig) -> Self {
        Self { router, config }
    }

    /// Creates a webhook service using the router's webhook settings.
    #[must_use]
    pub fn from_router(router: DeliveryRouter) -> Self {
        let config = router.config().webhook;
        Self::new(router, config)
    }

    /// Handles one webhook call and returns the HTTP response.
    ///
    /// Engine errors become error responses: invalid input is `400`, a
    /// foreign tenant is `403`, an unknown workflow or missing handler is
    /// `404`, a handler that does not answer in time is `504` and anything
    /// else is `500`.
    pub async fn invoke(
        &self,
        caller: &CallerIdentity,
        invocation: WebhookInvocation,
        body: Value,
    ) -> WebhookResponse {
        let webhook_name = invocation.webhook_name.clone();
        match self.try_invoke(caller, invocation, body).await {
            Ok(response) => response,
            Err(err) => {
                warn!(webhook = %webhook_name, error = %err, "webhook call rejected");
                error_response(&err)
            }
        }
    }

    async fn try_invoke(
        &self,
        caller: &CallerIdentity,
        invocation: WebhookInvocation,
        body: Value,
    ) -> DeliveryResult<WebhookResponse> {
        let workflow_type = invocation.workflow_type();
        let timeout = self.config.effective_timeout(invocation.timeout_seconds);
        let WebhookInvocation {
            webhook_name,
            participant_id,
            scope,
            authorization,
            ..
        } = invocation;

        let key = ThreadKey::from_parts(
            caller.tenant_id().as_str(),
            &workflow_type,
            &participant_id,
        )
        .map_err(ThreadRegistryError::from)?;
        let handler = self.router.handler_for(key.workflow_type())?;
        let request_id = RequestId::generate();

        let mut event = InboundEvent::new(
            caller.tenant_id().as_str(),
            workflow_type,
            participant_id,
            MessagePayload::Webhook(WebhookPayload {
                webhook_name: webhook_name.clone(),
                body,
                status_code: None,
            }),
        )
        .with_scope(Scope::parse(scope.as_deref()))
        .with_request_id(request_id.clone())
        .with_origin(MessageOrigin::Webhook);
        if let Some(token) = authorization {
            event = event.with_authorization(token);
        }

        let receipt = self.router.receive_key(caller, key, event).await?;
        let waiter = self.router.responder().open(&receipt.message)?;
        info!(
            webhook = %webhook_name,
            request_id = %request_id,
            thread_id = %receipt.thread.id(),
            "webhook call accepted"
        );

        let router = self.router.clone();
        tokio::spawn(async move {
            router.run_handler(handler, receipt).await;
        });

        match tokio::time::timeout(timeout, waiter).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => {
                let dropped = WebhookResponse::server_error("webhook handler dropped the request");
                self.close(&request_id, dropped).await
            }
            Err(_) => {
                warn!(webhook = %webhook_name, request_id = %request_id, ?timeout, "webhook handler timed out");
                self.close(&request_id, WebhookResponse::gateway_timeout())
                    .await
            }
        }
    }

    /// Closes an unanswered call and stores the response its caller gets.
    async fn close(
        &self,
        request_id: &RequestId,
        response: WebhookResponse,
    ) -> DeliveryResult<WebhookResponse> {
        let Some(origin) = self.router.responder().close(request_id)? else {
            return Ok(response);
        };
        if let Err(err) = self.router.record_webhook_outcome(&origin, &response).await {
            warn!(request_id = %request_id, error = %err, "failed to record webhook outcome");
        }
        Ok(response)
    }
}

fn error_response(err: &DeliveryError) -> WebhookResponse {
    match err {
        DeliveryError::Thread(ThreadRegistryError::InvalidKey(_))
        | DeliveryError::Index(ScopeIndexError::Validation(_)) => {
            WebhookResponse::bad_request(err.to_string())
        }
        DeliveryError::Thread(ThreadRegistryError::TenantMismatch { .. }) => {
            WebhookResponse::custom(403, json!({ "error": err.to_string() }))
        }
        DeliveryError::Thread(ThreadRegistryError::WorkflowNotFound(_))
        | DeliveryError::WorkflowNotFound(_)
        | DeliveryError::HandlerNotRegistered(_) => WebhookResponse::not_found(err.to_string()),
        _ => WebhookResponse::server_error(err.to_string()),
    }
}

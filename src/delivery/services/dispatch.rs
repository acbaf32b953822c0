//! Handler registration and dispatch of inbound messages.
//!
//! A workflow's behaviour is a [`MessageHandler`] registered under its
//! workflow type. Dispatch stores the inbound event first and then runs the
//! handler; a failing handler is logged and the participant receives the
//! configured fallback reply instead of silence.

use super::DeliveryRouter;
use crate::delivery::{
    domain::{A2aRequest, InboundEvent, InboundReceipt, WebhookResponse, WorkflowContext},
    error::{DeliveryError, DeliveryResult},
};
use crate::message::domain::{Message, MessagePayload};
use crate::tenancy::domain::{CallerIdentity, WorkflowType};
use crate::thread::domain::{Scope, Thread};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{debug, error};

/// Error returned by a message handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// An engine call made by the handler failed.
    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    /// The handler gave up with a reason.
    #[error("handler failed: {0}")]
    Failed(String),

    /// Any other failure.
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl HandlerError {
    /// Creates a [`HandlerError::Failed`] from a reason.
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }
}

/// Behaviour of a workflow for inbound messages.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Handles one inbound message.
    ///
    /// # Errors
    ///
    /// Any error makes the engine send the fallback reply.
    async fn handle(&self, ctx: HandlerContext) -> Result<(), HandlerError>;
}

/// Handler backed by an async closure.
pub struct FnHandler<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> MessageHandler for FnHandler<F>
where
    F: Fn(HandlerContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send,
{
    async fn handle(&self, ctx: HandlerContext) -> Result<(), HandlerError> {
        (self.f)(ctx).await
    }
}

/// Wraps an async closure as a shareable handler.
///
/// # Examples
///
/// ```
/// use parley::delivery::services::{handler_fn, HandlerContext, HandlerError};
///
/// let echo = handler_fn(|ctx: HandlerContext| async move {
///     let text = ctx.text().unwrap_or_default().to_owned();
///     ctx.reply(text, None).await?;
///     Ok::<_, HandlerError>(())
/// });
/// # drop(echo);
/// ```
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn MessageHandler>
where
    F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    Arc::new(FnHandler { f })
}

type HandlerMap = HashMap<WorkflowType, Arc<dyn MessageHandler>>;

/// Handlers keyed by workflow type.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: Arc<RwLock<HandlerMap>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `workflow_type`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Internal`] when the registry lock is
    /// poisoned.
    pub fn register(
        &self,
        workflow_type: WorkflowType,
        handler: Arc<dyn MessageHandler>,
    ) -> DeliveryResult<()> {
        let mut handlers = self.handlers.write().map_err(DeliveryError::internal)?;
        handlers.insert(workflow_type, handler);
        Ok(())
    }

    /// Returns the handler for `workflow_type`.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Internal`] when the registry lock is
    /// poisoned.
    pub fn get(&self, workflow_type: &WorkflowType) -> DeliveryResult<Option<Arc<dyn MessageHandler>>> {
        let handlers = self.handlers.read().map_err(DeliveryError::internal)?;
        Ok(handlers.get(workflow_type).cloned())
    }

    /// Returns `true` when a handler is registered for `workflow_type`.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Internal`] when the registry lock is
    /// poisoned.
    pub fn contains(&self, workflow_type: &WorkflowType) -> DeliveryResult<bool> {
        let handlers = self.handlers.read().map_err(DeliveryError::internal)?;
        Ok(handlers.contains_key(workflow_type))
    }
}

/// Everything a handler sees about the message it handles.
///
/// All sends go through the router, so they are persisted before they are
/// transmitted.
#[derive(Clone)]
pub struct HandlerContext {
    router: DeliveryRouter,
    receipt: InboundReceipt,
}

impl HandlerContext {
    pub(crate) const fn new(router: DeliveryRouter, receipt: InboundReceipt) -> Self {
        Self { router, receipt }
    }

    /// Returns the router.
    #[must_use]
    pub const fn router(&self) -> &DeliveryRouter {
        &self.router
    }

    /// Returns the workflow context.
    #[must_use]
    pub const fn workflow(&self) -> &WorkflowContext {
        &self.receipt.context
    }

    /// Returns the thread of the message.
    #[must_use]
    pub const fn thread(&self) -> &Thread {
        &self.receipt.thread
    }

    /// Returns the inbound message.
    #[must_use]
    pub const fn message(&self) -> &Message {
        &self.receipt.message
    }

    /// Returns the scope of the inbound message.
    #[must_use]
    pub const fn scope(&self) -> &Scope {
        self.receipt.message.scope()
    }

    /// Returns the text of the inbound message, if it has any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.receipt.message.payload().text()
    }

    /// Replies in the same thread and scope.
    ///
    /// # Errors
    ///
    /// See [`DeliveryRouter::reply`].
    pub async fn reply(
        &self,
        text: impl Into<String> + Send,
        data: Option<Value>,
    ) -> DeliveryResult<Message> {
        self.router.reply(&self.receipt.message, text, data).await
    }

    /// Answers the webhook call being handled.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::MissingRequestId`] when the inbound message
    /// carries no request id, plus the errors of
    /// [`DeliveryRouter::send_webhook_response`].
    pub async fn respond_webhook(&self, response: WebhookResponse) -> DeliveryResult<Message> {
        let message = &self.receipt.message;
        let request_id = message
            .request_id()
            .ok_or_else(|| DeliveryError::MissingRequestId(message.id()))?;
        self.router.send_webhook_response(request_id, response).await
    }

    /// Hands the conversation over to another workflow.
    ///
    /// # Errors
    ///
    /// See [`DeliveryRouter::send_handoff`].
    pub async fn send_handoff(
        &self,
        target_workflow: &WorkflowType,
        text: impl Into<String> + Send,
        data: Option<Value>,
    ) -> DeliveryResult<Message> {
        self.router
            .send_handoff(&self.receipt.message, target_workflow, text, data)
            .await
    }

    /// Sends a proactive message to any participant of this workflow.
    ///
    /// # Errors
    ///
    /// See [`DeliveryRouter::send_proactive`].
    pub async fn send_proactive(
        &self,
        participant_id: &str,
        text: impl Into<String> + Send,
        data: Option<Value>,
        scope: Option<Scope>,
    ) -> DeliveryResult<Message> {
        self.router
            .send_proactive(self.workflow(), participant_id, text, data, scope)
            .await
    }

    /// Sends a message as another built-in workflow of this agent.
    ///
    /// # Errors
    ///
    /// See [`DeliveryRouter::send_as_workflow`].
    pub async fn send_as_workflow(
        &self,
        workflow_name: &str,
        participant_id: &str,
        text: impl Into<String> + Send,
        data: Option<Value>,
        scope: Option<Scope>,
    ) -> DeliveryResult<Message> {
        self.router
            .send_as_workflow(self.workflow(), workflow_name, participant_id, text, data, scope)
            .await
    }

    /// Calls another workflow of the same tenant.
    ///
    /// # Errors
    ///
    /// See [`DeliveryRouter::send_to_workflow`].
    pub async fn send_to_workflow(&self, request: A2aRequest) -> DeliveryResult<Option<Message>> {
        self.router.send_to_workflow(self.workflow(), request).await
    }

    /// Returns the last hint set in this message's scope bucket.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Hint`] when the store fails.
    pub async fn last_hint(&self) -> DeliveryResult<Option<String>> {
        Ok(self
            .router
            .hints()
            .get_last_hint(self.receipt.thread.id(), self.scope())
            .await?)
    }
}

/// How a handler run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// The handler returned successfully.
    Completed,
    /// The handler failed and the fallback was sent.
    Failed(String),
}

/// Result of dispatching an inbound event.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    /// Where the event was stored.
    pub receipt: InboundReceipt,
    /// How the handler run ended.
    pub outcome: HandlerOutcome,
}

impl DeliveryRouter {
    /// Registers the handler for a workflow type.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Internal`] when the registry lock is
    /// poisoned.
    pub fn register_handler(
        &self,
        workflow_type: WorkflowType,
        handler: Arc<dyn MessageHandler>,
    ) -> DeliveryResult<()> {
        self.handlers().register(workflow_type, handler)
    }

    pub(crate) fn handler_for(
        &self,
        workflow_type: &WorkflowType,
    ) -> DeliveryResult<Arc<dyn MessageHandler>> {
        self.handlers()
            .get(workflow_type)?
            .ok_or_else(|| DeliveryError::HandlerNotRegistered(workflow_type.clone()))
    }

    /// Stores an inbound event and runs the workflow's handler on it.
    ///
    /// The handler runs to completion before this returns. Its failure does
    /// not fail the dispatch: the event stays stored and the outcome
    /// reports the failure.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::HandlerNotRegistered`] when no handler is
    /// registered for the workflow type, plus the errors of
    /// [`DeliveryRouter::receive`].
    pub async fn dispatch(
        &self,
        caller: &CallerIdentity,
        event: InboundEvent,
    ) -> DeliveryResult<DispatchOutcome> {
        let key = super::router::parse_key(&event)?;
        let handler = self.handler_for(key.workflow_type())?;
        let receipt = self.receive_key(caller, key, event).await?;
        let outcome = self.run_handler(handler, receipt.clone()).await;
        Ok(DispatchOutcome { receipt, outcome })
    }

    pub(crate) async fn run_handler(
        &self,
        handler: Arc<dyn MessageHandler>,
        receipt: InboundReceipt,
    ) -> HandlerOutcome {
        let inbound = receipt.message.clone();
        let ctx = HandlerContext::new(self.clone(), receipt);
        let Err(err) = handler.handle(ctx).await else {
            return HandlerOutcome::Completed;
        };

        error!(
            thread_id = %inbound.thread_id(),
            scope = %inbound.scope(),
            workflow_type = %inbound.workflow_type(),
            message_id = %inbound.id(),
            error = %err,
            "workflow handler failed"
        );
        self.send_fallback(&inbound).await;
        HandlerOutcome::Failed(err.to_string())
    }

    async fn send_fallback(&self, inbound: &Message) {
        let webhook_request = match inbound.payload() {
            MessagePayload::Webhook(_) => inbound.request_id(),
            _ => None,
        };
        let result = match webhook_request {
            Some(request_id) => {
                let response = WebhookResponse::server_error(self.config().fallback_reply.clone());
                self.send_webhook_response(request_id, response).await
            }
            None => {
                self.reply(inbound, self.config().fallback_reply.clone(), None)
                    .await
            }
        };
        match result {
            Ok(_) => {}
            Err(DeliveryError::DuplicateResponse { request_id }) => {
                debug!(request_id = %request_id, "webhook already answered before handler failed");
            }
            Err(err) => {
                error!(message_id = %inbound.id(), error = %err, "fallback reply failed");
            }
        }
    }
}

//! Delivery router: persist-then-transmit for every outbound path.
//!
//! Each operation stores the message through the scope index before the
//! transport sees it, so a failed transmission never loses the record of
//! what was meant to be sent. Transport failures are retried with the
//! configured exponential backoff; a rejection is final.

use super::{CorrelationTable, HandlerRegistry, WebhookResponder};
use crate::config::{ConfigError, EngineConfig};
use crate::delivery::{
    domain::{A2aRequest, InboundEvent, InboundReceipt, WebhookResponse, WorkflowContext},
    error::{DeliveryError, DeliveryResult},
    ports::{Transport, TransportError},
};
use crate::message::{
    domain::{
        HandoffPayload, Message, MessageDraft, MessageOrigin, MessagePayload, RequestId,
        WebhookPayload,
    },
    error::ValidationError,
    ports::MessageStore,
    services::{HintOverlay, ScopeIndex, ScopeIndexError},
    validation::DefaultMessageValidator,
};
use crate::tenancy::{
    domain::{CallerIdentity, WorkflowType},
    services::AgentRegistryService,
};
use crate::thread::{
    domain::{Scope, Thread, ThreadId, ThreadKey},
    services::{ThreadRegistryError, ThreadRegistryService},
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Routes inbound events to threads and outbound messages to their
/// destination.
///
/// Cloning is cheap; clones share handlers, correlation state and webhook
/// response slots.
#[derive(Clone)]
pub struct DeliveryRouter {
    threads: ThreadRegistryService,
    agents: AgentRegistryService,
    index: ScopeIndex,
    hints: HintOverlay,
    transport: Arc<dyn Transport>,
    handlers: HandlerRegistry,
    correlations: CorrelationTable,
    responder: WebhookResponder,
    config: Arc<EngineConfig>,
}

impl DeliveryRouter {
    /// Creates a router over the given registries, index and transport.
    ///
    /// The index is used as given; prefer [`Self::from_config`] unless a
    /// custom validator is needed. The configuration is not validated here.
    #[must_use]
    pub fn new(
        threads: ThreadRegistryService,
        agents: AgentRegistryService,
        index: ScopeIndex,
        transport: Arc<dyn Transport>,
        config: EngineConfig,
    ) -> Self {
        let hints = HintOverlay::new(Arc::clone(index.store()));
        Self {
            threads,
            agents,
            index,
            hints,
            transport,
            handlers: HandlerRegistry::new(),
            correlations: CorrelationTable::new(),
            responder: WebhookResponder::with_retention(config.webhook.answered_retention),
            config: Arc::new(config),
        }
    }

    /// Assembles a router from a validated engine configuration.
    ///
    /// The scope index gets the configured history limits and a
    /// [`DefaultMessageValidator`] built from the validation section. The
    /// webhook responder keeps the configured number of answered request
    /// ids.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the configuration fails
    /// [`EngineConfig::validate`].
    pub fn from_config(
        threads: ThreadRegistryService,
        agents: AgentRegistryService,
        store: Arc<dyn MessageStore>,
        transport: Arc<dyn Transport>,
        config: EngineConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let index = ScopeIndex::new(
            store,
            Arc::new(DefaultMessageValidator::with_config(
                config.validation.clone(),
            )),
            config.history,
        );
        Ok(Self::new(threads, agents, index, transport, config))
    }

    /// Returns the thread registry.
    #[must_use]
    pub const fn threads(&self) -> &ThreadRegistryService {
        &self.threads
    }

    /// Returns the agent registry.
    #[must_use]
    pub const fn agents(&self) -> &AgentRegistryService {
        &self.agents
    }

    /// Returns the scope index.
    #[must_use]
    pub const fn index(&self) -> &ScopeIndex {
        &self.index
    }

    /// Returns the hint overlay.
    #[must_use]
    pub const fn hints(&self) -> &HintOverlay {
        &self.hints
    }

    /// Returns the handler registry.
    #[must_use]
    pub const fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Returns the outstanding agent-to-agent waits.
    #[must_use]
    pub const fn correlations(&self) -> &CorrelationTable {
        &self.correlations
    }

    /// Returns the webhook response slots.
    #[must_use]
    pub const fn responder(&self) -> &WebhookResponder {
        &self.responder
    }

    /// Returns the engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Stores an inbound event in its thread and scope.
    ///
    /// The thread is created on first use. The returned receipt carries the
    /// workflow context resolved for the event.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Thread`] for invalid keys, tenant mismatch
    /// or unknown workflows and [`DeliveryError::Index`] when the message is
    /// rejected or cannot be stored.
    pub async fn receive(
        &self,
        caller: &CallerIdentity,
        event: InboundEvent,
    ) -> DeliveryResult<InboundReceipt> {
        let key = parse_key(&event)?;
        self.receive_key(caller, key, event).await
    }

    pub(crate) async fn receive_key(
        &self,
        caller: &CallerIdentity,
        key: ThreadKey,
        event: InboundEvent,
    ) -> DeliveryResult<InboundReceipt> {
        let thread = self.threads.resolve_key(caller, key).await?;
        let InboundEvent {
            scope,
            payload,
            metadata,
            hint,
            request_id,
            authorization,
            origin,
            ..
        } = event;

        let draft = MessageDraft::incoming(
            thread.key().participant_id().clone(),
            thread.key().workflow_type().clone(),
            payload,
        )
        .with_origin(origin)
        .with_metadata(metadata)
        .with_hint(hint)
        .with_request_id(request_id)
        .with_authorization_token(authorization.as_deref());

        let (bucket_id, message) = self.index.place(thread.id(), &scope, draft).await?;
        debug!(
            thread_id = %thread.id(),
            scope = %scope,
            message_id = %message.id(),
            message_type = %message.payload().message_type(),
            "inbound message stored"
        );

        Ok(InboundReceipt {
            context: WorkflowContext::new(caller.clone(), thread.key().workflow_type().clone()),
            thread,
            bucket_id,
            message,
        })
    }

    /// Replies to an inbound message.
    ///
    /// The reply inherits thread, scope, participant and request id. A
    /// reply to an agent-to-agent call goes to the waiting caller; any other
    /// reply goes to the transport.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Index`] when the reply cannot be stored and
    /// [`DeliveryError::Transmission`] when it was stored but could not be
    /// delivered.
    pub async fn reply(
        &self,
        inbound: &Message,
        text: impl Into<String> + Send,
        data: Option<Value>,
    ) -> DeliveryResult<Message> {
        let draft = MessageDraft::outgoing(
            inbound.participant_id().clone(),
            inbound.workflow_type().clone(),
            MessagePayload::chat_with_data(text, data),
        )
        .with_request_id(inbound.request_id().cloned());
        self.deliver(inbound.thread_id(), inbound.scope(), draft)
            .await
    }

    /// Sends a message to a participant without a preceding inbound message.
    ///
    /// The scope defaults to the null scope.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Thread`] when the participant's thread
    /// cannot be resolved, plus the errors of [`Self::reply`].
    pub async fn send_proactive(
        &self,
        ctx: &WorkflowContext,
        participant_id: &str,
        text: impl Into<String> + Send,
        data: Option<Value>,
        scope: Option<Scope>,
    ) -> DeliveryResult<Message> {
        self.send_payload(
            ctx,
            participant_id,
            scope.unwrap_or_default(),
            MessagePayload::chat_with_data(text, data),
            None,
        )
        .await
    }

    /// Sends a proactive payload carrying a hint.
    ///
    /// # Errors
    ///
    /// As for [`Self::send_proactive`].
    pub async fn send_payload(
        &self,
        ctx: &WorkflowContext,
        participant_id: &str,
        scope: Scope,
        payload: MessagePayload,
        hint: Option<String>,
    ) -> DeliveryResult<Message> {
        let thread = self
            .resolve_thread(ctx.caller(), ctx.workflow_type(), participant_id)
            .await?;
        let draft = MessageDraft::outgoing(
            thread.key().participant_id().clone(),
            ctx.workflow_type().clone(),
            payload,
        )
        .with_hint(hint);
        self.deliver(thread.id(), &scope, draft).await
    }

    /// Sends a message as another built-in workflow of the caller's agent.
    ///
    /// The message lands in the impersonated workflow's thread for the
    /// participant; its origin records the workflow that actually sent it.
    /// Only the workflow definition has to exist.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::WorkflowNotFound`] when the short name is
    /// unknown or ambiguous, plus the errors of [`Self::send_proactive`].
    pub async fn send_as_workflow(
        &self,
        ctx: &WorkflowContext,
        workflow_name: &str,
        participant_id: &str,
        text: impl Into<String> + Send,
        data: Option<Value>,
        scope: Option<Scope>,
    ) -> DeliveryResult<Message> {
        let target = self
            .agents
            .resolve_builtin_by_name(ctx.tenant_id(), ctx.agent(), workflow_name)
            .await?;
        let thread = self
            .resolve_thread(ctx.caller(), &target.workflow_type, participant_id)
            .await?;

        let draft = MessageDraft::outgoing(
            thread.key().participant_id().clone(),
            target.workflow_type.clone(),
            MessagePayload::chat_with_data(text, data),
        )
        .with_origin(MessageOrigin::Workflow {
            workflow_type: ctx.workflow_type().clone(),
        });
        let message = self
            .deliver(thread.id(), &scope.unwrap_or_default(), draft)
            .await?;
        info!(
            sender = %ctx.workflow_type(),
            impersonated = %target.workflow_type,
            thread_id = %thread.id(),
            "message sent as workflow"
        );
        Ok(message)
    }

    /// Sends the response to an inbound webhook call.
    ///
    /// Only the first stored response per request id is accepted. The
    /// response is stored as an outgoing webhook message before it is handed
    /// to the waiting caller. A response that fails validation or storage
    /// leaves the request open, so the handler can send a corrected one.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::DuplicateResponse`] when the request was
    /// already answered or another response is being stored,
    /// [`DeliveryError::UnknownRequest`] when no such request is open or the
    /// caller already timed out and [`DeliveryError::Index`] for an invalid status
    /// code or a storage failure.
    pub async fn send_webhook_response(
        &self,
        request_id: &RequestId,
        response: WebhookResponse,
    ) -> DeliveryResult<Message> {
        if !(100..=599).contains(&response.status_code) {
            return Err(ScopeIndexError::from(ValidationError::InvalidStatusCode(
                response.status_code,
            ))
            .into());
        }

        let claim = self.responder.claim(request_id)?;
        let origin = claim.origin();
        let draft = webhook_response_draft(origin, request_id, &response);
        let placed = self
            .index
            .place(origin.thread_id(), origin.scope(), draft)
            .await;
        let message = match placed {
            Ok((_, message)) => message,
            Err(err) => {
                self.responder.reopen(claim)?;
                return Err(err.into());
            }
        };

        let status = response.status_code;
        if self.responder.settle(claim, response)? {
            debug!(request_id = %request_id, status, "webhook response delivered");
        } else {
            warn!(request_id = %request_id, status, "webhook caller no longer waiting");
        }
        Ok(message)
    }

    /// Stores the response a webhook caller received without its handler
    /// answering, such as a gateway timeout.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::MissingRequestId`] when `origin` is not a
    /// webhook call with a request id and [`DeliveryError::Index`] when the
    /// response cannot be stored.
    pub async fn record_webhook_outcome(
        &self,
        origin: &Message,
        response: &WebhookResponse,
    ) -> DeliveryResult<Message> {
        let request_id = origin
            .request_id()
            .ok_or_else(|| DeliveryError::MissingRequestId(origin.id()))?;
        let draft = webhook_response_draft(origin, request_id, response);
        let (_, message) = self
            .index
            .place(origin.thread_id(), origin.scope(), draft)
            .await?;
        Ok(message)
    }

    /// Records a handoff to another workflow in the thread of `from`.
    ///
    /// The handoff only tells the delivery surface to switch to the target
    /// workflow; no execution state moves.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::WorkflowNotFound`] when the target is not
    /// visible to the thread's tenant, plus the errors of [`Self::reply`].
    pub async fn send_handoff(
        &self,
        from: &Message,
        target_workflow: &WorkflowType,
        text: impl Into<String> + Send,
        data: Option<Value>,
    ) -> DeliveryResult<Message> {
        let thread = self.threads.get(from.thread_id()).await?.ok_or_else(|| {
            DeliveryError::internal(format_args!("thread {} is not registered", from.thread_id()))
        })?;
        self.agents
            .resolve_workflow(thread.key().tenant_id(), target_workflow)
            .await?;

        let draft = MessageDraft::outgoing(
            from.participant_id().clone(),
            from.workflow_type().clone(),
            MessagePayload::Handoff(HandoffPayload {
                target_workflow: target_workflow.clone(),
                text: text.into(),
                data,
            }),
        );
        let message = self.deliver(from.thread_id(), from.scope(), draft).await?;
        info!(
            thread_id = %thread.id(),
            from = %from.workflow_type(),
            to = %target_workflow,
            "handoff recorded"
        );
        Ok(message)
    }

    /// Calls another workflow of the same tenant.
    ///
    /// The call is stored as an incoming message in the target's thread and
    /// dispatched to the target's handler in the background. When a reply
    /// is expected the caller waits for it up to the configured A2A
    /// timeout; otherwise `None` is returned straight away.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::WorkflowNotFound`] for an unknown target,
    /// [`DeliveryError::HandlerNotRegistered`] when nothing handles it,
    /// [`DeliveryError::ReplyTimeout`] when no reply arrives in time and
    /// [`DeliveryError::ReplyAbandoned`] when the wait is dropped.
    pub async fn send_to_workflow(
        &self,
        ctx: &WorkflowContext,
        request: A2aRequest,
    ) -> DeliveryResult<Option<Message>> {
        let A2aRequest {
            target_workflow,
            participant_id,
            scope,
            payload,
            expect_reply,
        } = request;

        self.agents
            .resolve_workflow(ctx.tenant_id(), &target_workflow)
            .await?;
        let handler = self.handler_for(&target_workflow)?;
        let request_id = RequestId::generate();
        let waiter = if expect_reply {
            Some(self.correlations.register(request_id.clone())?)
        } else {
            None
        };

        let event = InboundEvent::new(
            ctx.tenant_id().as_str(),
            target_workflow.to_string(),
            participant_id,
            payload,
        )
        .with_scope(scope)
        .with_request_id(request_id.clone())
        .with_origin(MessageOrigin::Workflow {
            workflow_type: ctx.workflow_type().clone(),
        });
        let receipt = match self.receive(ctx.caller(), event).await {
            Ok(stored) => stored,
            Err(err) => {
                self.correlations.cancel(&request_id)?;
                return Err(err);
            }
        };
        info!(
            from = %ctx.workflow_type(),
            to = %target_workflow,
            request_id = %request_id,
            expect_reply,
            "agent-to-agent call"
        );

        let router = self.clone();
        tokio::spawn(async move {
            router.run_handler(handler, receipt).await;
        });

        let Some(reply) = waiter else {
            return Ok(None);
        };
        match tokio::time::timeout(self.config.a2a.reply_timeout(), reply).await {
            Ok(Ok(message)) => Ok(Some(message)),
            Ok(Err(_)) => Err(DeliveryError::ReplyAbandoned { request_id }),
            Err(_) => {
                self.correlations.cancel(&request_id)?;
                warn!(request_id = %request_id, to = %target_workflow, "agent-to-agent reply timed out");
                Err(DeliveryError::ReplyTimeout { request_id })
            }
        }
    }

    /// Stores an outgoing draft, then routes it to a waiting caller or the
    /// transport.
    pub(crate) async fn deliver(
        &self,
        thread_id: ThreadId,
        scope: &Scope,
        draft: MessageDraft,
    ) -> DeliveryResult<Message> {
        let (_, message) = self.index.place(thread_id, scope, draft).await?;
        if self.correlations.complete(&message)? {
            debug!(message_id = %message.id(), "reply handed to waiting workflow");
            return Ok(message);
        }
        self.transmit(&message).await?;
        Ok(message)
    }

    pub(crate) async fn resolve_thread(
        &self,
        caller: &CallerIdentity,
        workflow_type: &WorkflowType,
        participant_id: &str,
    ) -> DeliveryResult<Thread> {
        Ok(self
            .threads
            .resolve_or_create(
                caller,
                caller.tenant_id().as_str(),
                &workflow_type.to_string(),
                participant_id,
            )
            .await?)
    }

    async fn transmit(&self, message: &Message) -> DeliveryResult<()> {
        let policy = self.config.retry;
        let mut attempt: u32 = 1;
        loop {
            match self.transport.transmit(message).await {
                Ok(()) => return Ok(()),
                Err(err @ TransportError::Unavailable(_)) if attempt < policy.max_attempts => {
                    let delay = policy.backoff_for(attempt);
                    warn!(
                        message_id = %message.id(),
                        attempt,
                        ?delay,
                        error = %err,
                        "transmission failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt = attempt.saturating_add(1);
                }
                Err(err) => {
                    warn!(
                        message_id = %message.id(),
                        attempt,
                        error = %err,
                        "transmission failed, giving up"
                    );
                    return Err(DeliveryError::Transmission {
                        message_id: message.id(),
                        reason: err.to_string(),
                    });
                }
            }
        }
    }
}

fn webhook_response_draft(
    origin: &Message,
    request_id: &RequestId,
    response: &WebhookResponse,
) -> MessageDraft {
    let webhook_name = match origin.payload() {
        MessagePayload::Webhook(call) => call.webhook_name.clone(),
        _ => String::new(),
    };
    let headers = response
        .headers
        .iter()
        .map(|(name, value)| (name.clone(), Value::String(value.clone())))
        .collect();
    MessageDraft::outgoing(
        origin.participant_id().clone(),
        origin.workflow_type().clone(),
        MessagePayload::Webhook(WebhookPayload {
            webhook_name,
            body: response.body.clone(),
            status_code: Some(response.status_code),
        }),
    )
    .with_metadata(headers)
    .with_request_id(Some(request_id.clone()))
}

pub(crate) fn parse_key(event: &InboundEvent) -> DeliveryResult<ThreadKey> {
    ThreadKey::from_parts(
        &event.tenant_id,
        &event.workflow_type,
        &event.participant_id,
    )
    .map_err(|err| DeliveryError::Thread(ThreadRegistryError::InvalidKey(err)))
}

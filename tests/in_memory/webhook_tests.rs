//! Webhook calls answered by registered handlers.

use parley::delivery::{
    domain::{WebhookInvocation, WebhookResponse},
    error::DeliveryError,
    services::{HandlerContext, HandlerError, handler_fn},
};
use parley::message::domain::Direction;
use parley::tenancy::domain::WorkflowType;
use parley::thread::domain::Scope;
use rstest::rstest;
use serde_json::json;

use crate::test_helpers::{TENANT, caller, engine};

fn invocation(scope: Option<&str>) -> WebhookInvocation {
    WebhookInvocation {
        api_key: "key".to_owned(),
        agent_name: "Support".to_owned(),
        workflow_name: "Orders".to_owned(),
        webhook_name: "order-created".to_owned(),
        participant_id: "shop-1".to_owned(),
        scope: scope.map(str::to_owned),
        authorization: Some("secret-token".to_owned()),
        timeout_seconds: Some(5),
    }
}

#[rstest]
#[tokio::test]
async fn handler_answers_webhook_once() -> Result<(), eyre::Report> {
    let engine = engine().await?;
    engine.router.register_handler(
        WorkflowType::parse("Support:Orders")?,
        handler_fn(|handler: HandlerContext| async move {
            let order = handler
                .message()
                .payload()
                .structured_data()
                .and_then(|body| body.get("orderId"))
                .cloned()
                .unwrap_or_default();
            handler
                .respond_webhook(WebhookResponse::ok(json!({"accepted": order})))
                .await?;
            Ok::<_, HandlerError>(())
        }),
    )?;

    let response = engine
        .webhooks
        .invoke(&caller(TENANT)?, invocation(Some("order-7")), json!({"orderId": 7}))
        .await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, json!({"accepted": 7}));

    let thread = engine
        .router
        .threads()
        .resolve_or_create(&caller(TENANT)?, TENANT, "Support:Orders", "shop-1")
        .await?;
    let page = engine
        .router
        .index()
        .latest(thread.id(), &Scope::named("order-7")?)
        .await?;
    let directions: Vec<Direction> = page.messages.iter().map(|m| m.direction()).collect();
    assert_eq!(directions, [Direction::Outgoing, Direction::Incoming]);

    let request_id = page
        .messages
        .last()
        .and_then(|message| message.request_id().cloned())
        .ok_or_else(|| eyre::eyre!("incoming webhook message has no request id"))?;
    let second = engine
        .router
        .send_webhook_response(&request_id, WebhookResponse::ok(json!({})))
        .await;
    assert!(matches!(second, Err(DeliveryError::DuplicateResponse { .. })));
    Ok(())
}

#[rstest]
#[tokio::test]
async fn webhook_without_handler_is_not_found() -> Result<(), eyre::Report> {
    let engine = engine().await?;

    let response = engine
        .webhooks
        .invoke(&caller(TENANT)?, invocation(None), json!({}))
        .await;

    assert_eq!(response.status_code, 404);
    Ok(())
}

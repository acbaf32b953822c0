//! Webhook invocation and response contracts.
//!
//! An HTTP layer deserialises the query string of
//! `POST /api/user/webhooks/builtin` into [`WebhookInvocation`], passes the
//! JSON body alongside it, and writes the returned [`WebhookResponse`]
//! back to the caller.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// Query parameters of an inbound webhook call.
///
/// # Examples
///
/// ```
/// use parley::delivery::domain::WebhookInvocation;
///
/// let invocation: WebhookInvocation = serde_json::from_value(serde_json::json!({
///     "apikey": "key",
///     "agentName": "Orders",
///     "workflowName": "Intake",
///     "webhookName": "order-created",
///     "participantId": "shop-1",
///     "timeoutSeconds": 10
/// }))
/// .expect("valid invocation");
///
/// assert_eq!(invocation.workflow_type(), "Orders:Intake");
/// assert!(invocation.scope.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookInvocation {
    /// API key presented by the caller; authenticated by the HTTP layer.
    #[serde(rename = "apikey")]
    pub api_key: String,
    /// Agent owning the workflow.
    pub agent_name: String,
    /// Workflow receiving the call.
    pub workflow_name: String,
    /// Name of the webhook endpoint within the workflow.
    pub webhook_name: String,
    /// Participant whose thread records the call.
    pub participant_id: String,
    /// Optional scope; blank means the null scope.
    #[serde(default)]
    pub scope: Option<String>,
    /// Optional authorization token forwarded to the handler.
    #[serde(default)]
    pub authorization: Option<String>,
    /// Optional wait for the handler response.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

impl WebhookInvocation {
    /// Returns the composite workflow type `Agent:Workflow`.
    #[must_use]
    pub fn workflow_type(&self) -> String {
        format!("{}:{}", self.agent_name.trim(), self.workflow_name.trim())
    }
}

/// HTTP response produced for a webhook call.
///
/// # Examples
///
/// ```
/// use parley::delivery::domain::WebhookResponse;
///
/// let response = WebhookResponse::ok(serde_json::json!({"accepted": true}))
///     .with_header("X-Trace", "abc");
/// assert_eq!(response.status_code, 200);
/// assert_eq!(response.headers.get("X-Trace").map(String::as_str), Some("abc"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    /// HTTP status code.
    pub status_code: u16,
    /// JSON body.
    pub body: Value,
    /// Additional response headers.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl WebhookResponse {
    /// Creates a response with an arbitrary status code.
    #[must_use]
    pub const fn custom(status_code: u16, body: Value) -> Self {
        Self {
            status_code,
            body,
            headers: BTreeMap::new(),
        }
    }

    /// `200 OK` with a body.
    #[must_use]
    pub const fn ok(body: Value) -> Self {
        Self::custom(200, body)
    }

    /// `400 Bad Request` with an error message.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::error(400, message)
    }

    /// `404 Not Found` with an error message.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::error(404, message)
    }

    /// `500 Internal Server Error` with an error message.
    #[must_use]
    pub fn server_error(message: impl Into<String>) -> Self {
        Self::error(500, message)
    }

    /// `504 Gateway Timeout`, used when no response arrives in time.
    #[must_use]
    pub fn gateway_timeout() -> Self {
        Self::error(504, "webhook handler did not respond in time")
    }

    /// Adds a response header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Returns `true` for 2xx status codes.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status_code >= 200 && self.status_code < 300
    }

    fn error(status_code: u16, message: impl Into<String>) -> Self {
        Self::custom(status_code, json!({ "error": message.into() }))
    }
}

//! Admin messaging request contract.
//!
//! Mirrors the body of
//! `POST /api/v1/admin/tenants/{tenantId}/messaging/send`. The tenant is
//! taken from the path and passed separately.

use crate::message::domain::{FilePayload, MessagePayload, MessageType, WebhookPayload};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Reasons an admin request cannot be turned into a payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdminRequestError {
    /// The `type` field names an unknown or unsupported message type.
    #[error("unsupported message type '{0}'")]
    UnsupportedType(String),

    /// File data is neither a base64 string nor a content object.
    #[error("file data must be a base64 string or an object with 'content'")]
    InvalidFileData,

    /// File content is not valid base64.
    #[error("file content is not valid base64: {0}")]
    InvalidBase64(String),

    /// A webhook message names its webhook neither in `text` nor in
    /// `data.webhookName`.
    #[error("webhook messages need a webhook name in 'text' or 'data.webhookName'")]
    MissingWebhookName,
}

/// Body of an admin send request.
///
/// # Examples
///
/// ```
/// use parley::delivery::domain::AdminSendRequest;
/// use parley::message::domain::MessageType;
///
/// let request: AdminSendRequest = serde_json::from_value(serde_json::json!({
///     "agentName": "Support",
///     "activationName": "Conversational",
///     "participantId": "u1",
///     "type": "File",
///     "data": {"content": "aGk=", "fileName": "hi.txt"}
/// }))
/// .expect("valid request");
///
/// let payload = request.payload().expect("valid payload");
/// assert_eq!(payload.message_type(), MessageType::File);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSendRequest {
    /// Agent owning the workflow.
    pub agent_name: String,
    /// Name of the workflow that sends the message.
    pub activation_name: String,
    /// Recipient participant.
    pub participant_id: String,
    /// Message type: `Chat`, `Data`, `File` or `Webhook`.
    #[serde(rename = "type")]
    pub message_type: String,
    /// Structured data; base64 content for files.
    #[serde(default)]
    pub data: Value,
    /// Optional text. Names the webhook for `Webhook` messages, falling back
    /// to `data.webhookName`.
    #[serde(default)]
    pub text: Option<String>,
    /// Optional scope; blank means the null scope.
    #[serde(default)]
    pub scope: Option<String>,
    /// Optional hint.
    #[serde(default)]
    pub hint: Option<String>,
    /// Optional correlation identifier.
    #[serde(default)]
    pub request_id: Option<String>,
    /// Optional authorization token, fingerprinted on storage.
    #[serde(default)]
    pub authorization: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileData {
    content: String,
    #[serde(default)]
    file_name: Option<String>,
    #[serde(default)]
    content_type: Option<String>,
}

impl AdminSendRequest {
    /// Builds the typed payload described by the request.
    ///
    /// # Errors
    ///
    /// Returns [`AdminRequestError`] for unsupported types and malformed
    /// file data.
    pub fn payload(&self) -> Result<MessagePayload, AdminRequestError> {
        let kind = MessageType::parse(&self.message_type)
            .map_err(|_| AdminRequestError::UnsupportedType(self.message_type.clone()))?;
        match kind {
            MessageType::Chat => Ok(self.chat_payload()),
            MessageType::Data => Ok(MessagePayload::Data {
                data: self.data.clone(),
                text: self.text.clone(),
            }),
            MessageType::File => self.file_payload(),
            MessageType::Webhook => self.webhook_payload(),
            MessageType::Handoff => Err(AdminRequestError::UnsupportedType(
                self.message_type.clone(),
            )),
        }
    }

    fn chat_payload(&self) -> MessagePayload {
        match (&self.text, &self.data) {
            (Some(text), Value::Null) => MessagePayload::chat(text.clone()),
            (Some(text), data) => MessagePayload::chat_with_data(text.clone(), Some(data.clone())),
            (None, Value::String(text)) => MessagePayload::chat(text.clone()),
            (None, Value::Null) => MessagePayload::chat(String::new()),
            (None, data) => MessagePayload::chat_with_data(String::new(), Some(data.clone())),
        }
    }

    fn webhook_payload(&self) -> Result<MessagePayload, AdminRequestError> {
        let webhook_name = self
            .text
            .as_deref()
            .or_else(|| self.data.get("webhookName").and_then(Value::as_str))
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(AdminRequestError::MissingWebhookName)?;
        Ok(MessagePayload::Webhook(WebhookPayload {
            webhook_name: webhook_name.to_owned(),
            body: self.data.clone(),
            status_code: None,
        }))
    }

    fn file_payload(&self) -> Result<MessagePayload, AdminRequestError> {
        let file = match &self.data {
            Value::String(content) => FileData {
                content: content.clone(),
                file_name: None,
                content_type: None,
            },
            Value::Object(_) => serde_json::from_value(self.data.clone())
                .map_err(|_| AdminRequestError::InvalidFileData)?,
            _ => return Err(AdminRequestError::InvalidFileData),
        };

        let bytes = STANDARD
            .decode(file.content.trim())
            .map_err(|err| AdminRequestError::InvalidBase64(err.to_string()))?;
        let mut payload = FilePayload::new(bytes);
        if let Some(name) = file.file_name {
            payload = payload.with_file_name(name);
        }
        if let Some(content_type) = file.content_type {
            payload = payload.with_content_type(content_type);
        }
        if let Some(text) = &self.text {
            payload = payload.with_text(text.clone());
        }
        Ok(MessagePayload::File(payload))
    }
}

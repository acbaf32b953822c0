//! Tagged payload union carried by every message.

use crate::tenancy::domain::WorkflowType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// The typed body of a message.
///
/// Serialised with an internal `type` tag so stored rows and wire payloads
/// are self-describing.
///
/// # Examples
///
/// ```
/// use parley::message::domain::{MessagePayload, MessageType};
///
/// let payload = MessagePayload::chat("Hi");
/// assert_eq!(payload.message_type(), MessageType::Chat);
/// assert_eq!(payload.text(), Some("Hi"));
///
/// let json = serde_json::to_value(&payload).expect("serialise");
/// assert_eq!(json["type"], "chat");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessagePayload {
    /// Conversational text, optionally with structured data.
    Chat {
        /// The message text.
        text: String,
        /// Optional structured data.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
    },
    /// Structured data, optionally with a text summary.
    Data {
        /// The structured payload.
        data: Value,
        /// Optional text.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },
    /// A binary file.
    File(FilePayload),
    /// A webhook call or webhook response.
    Webhook(WebhookPayload),
    /// A request to switch the delivery surface to another workflow.
    Handoff(HandoffPayload),
}

impl MessagePayload {
    /// Creates a chat payload.
    #[must_use]
    pub fn chat(text: impl Into<String>) -> Self {
        Self::Chat {
            text: text.into(),
            data: None,
        }
    }

    /// Creates a chat payload carrying structured data.
    #[must_use]
    pub fn chat_with_data(text: impl Into<String>, data: Option<Value>) -> Self {
        Self::Chat {
            text: text.into(),
            data,
        }
    }

    /// Creates a data payload.
    #[must_use]
    pub const fn data(data: Value) -> Self {
        Self::Data { data, text: None }
    }

    /// Returns the discriminant of the payload.
    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        match self {
            Self::Chat { .. } => MessageType::Chat,
            Self::Data { .. } => MessageType::Data,
            Self::File(_) => MessageType::File,
            Self::Webhook(_) => MessageType::Webhook,
            Self::Handoff(_) => MessageType::Handoff,
        }
    }

    /// Returns the text carried by the payload, if any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Chat { text, .. } => Some(text),
            Self::Data { text, .. } => text.as_deref(),
            Self::File(file) => file.text.as_deref(),
            Self::Webhook(_) => None,
            Self::Handoff(handoff) => Some(&handoff.text),
        }
    }

    /// Returns the structured data carried by the payload, if any.
    #[must_use]
    pub const fn structured_data(&self) -> Option<&Value> {
        match self {
            Self::Chat { data, .. } => data.as_ref(),
            Self::Data { data, .. } => Some(data),
            Self::File(_) => None,
            Self::Webhook(webhook) => Some(&webhook.body),
            Self::Handoff(handoff) => handoff.data.as_ref(),
        }
    }
}

/// A file attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePayload {
    /// Raw file bytes, base64-encoded when serialised.
    #[serde(with = "base64_bytes")]
    pub content: Vec<u8>,
    /// Original file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// MIME type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Optional caption.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl FilePayload {
    /// Creates a file payload from raw bytes.
    #[must_use]
    pub const fn new(content: Vec<u8>) -> Self {
        Self {
            content,
            file_name: None,
            content_type: None,
            text: None,
        }
    }

    /// Sets the file name.
    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Sets the MIME type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Sets the caption.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// An inbound webhook call or the response sent back for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookPayload {
    /// Name of the webhook endpoint within the workflow.
    pub webhook_name: String,
    /// JSON body of the call or response.
    pub body: Value,
    /// HTTP status code, set on responses only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

/// A handoff to another workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandoffPayload {
    /// The workflow the surface should switch to.
    pub target_workflow: WorkflowType,
    /// Text shown to the participant.
    pub text: String,
    /// Optional structured data for the target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Discriminant of [`MessagePayload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// Conversational text.
    Chat,
    /// Structured data.
    Data,
    /// Binary file.
    File,
    /// Webhook call or response.
    Webhook,
    /// Handoff signal.
    Handoff,
}

/// Error returned when a message type string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown message type '{0}'")]
pub struct ParseMessageTypeError(pub String);

impl MessageType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Data => "data",
            Self::File => "file",
            Self::Webhook => "webhook",
            Self::Handoff => "handoff",
        }
    }

    /// Parses a type name, ignoring ASCII case.
    ///
    /// # Errors
    ///
    /// Returns [`ParseMessageTypeError`] for unknown names.
    pub fn parse(value: &str) -> Result<Self, ParseMessageTypeError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "chat" => Ok(Self::Chat),
            "data" => Ok(Self::Data),
            "file" => Ok(Self::File),
            "webhook" => Ok(Self::Webhook),
            "handoff" => Ok(Self::Handoff),
            _ => Err(ParseMessageTypeError(value.to_owned())),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

mod base64_bytes {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

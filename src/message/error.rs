//! Error types for message validation and storage.
//!
//! Uses `thiserror` for typed variants that callers can inspect.

use std::sync::Arc;
use thiserror::Error;

/// Errors raised while validating a message draft.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Chat text is empty or whitespace-only.
    #[error("text content cannot be empty")]
    EmptyText,

    /// Text exceeds the configured length.
    #[error("text has {actual} characters, exceeds limit of {max}")]
    TextTooLong {
        /// The maximum allowed length.
        max: usize,
        /// The actual length.
        actual: usize,
    },

    /// Structured data exceeds the configured size.
    #[error("data payload of {actual_bytes} bytes exceeds limit of {limit_bytes} bytes")]
    DataTooLarge {
        /// The serialised size.
        actual_bytes: usize,
        /// The configured limit.
        limit_bytes: usize,
    },

    /// A file payload has no content.
    #[error("file content cannot be empty")]
    EmptyFile,

    /// A file exceeds the configured size.
    #[error("file of {actual_bytes} bytes exceeds limit of {limit_bytes} bytes")]
    FileTooLarge {
        /// The file size.
        actual_bytes: usize,
        /// The configured limit.
        limit_bytes: usize,
    },

    /// A webhook payload has a blank name.
    #[error("webhook name cannot be empty")]
    EmptyWebhookName,

    /// A webhook response carries a status outside 100..=599.
    #[error("invalid HTTP status code {0}")]
    InvalidStatusCode(u16),

    /// Metadata validation failed.
    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),

    /// Too many metadata entries.
    #[error("message has {actual} metadata entries, exceeds limit of {max}")]
    TooManyMetadataEntries {
        /// The maximum allowed number of entries.
        max: usize,
        /// The actual number of entries.
        actual: usize,
    },

    /// A hint exceeds the configured length.
    #[error("hint has {actual} characters, exceeds limit of {max}")]
    HintTooLong {
        /// The maximum allowed length.
        max: usize,
        /// The actual length.
        actual: usize,
    },

    /// Multiple validation errors occurred.
    #[error("multiple validation errors: {}", format_errors(.0))]
    Multiple(Vec<Self>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    /// Combines multiple validation errors into a single error.
    ///
    /// A single error is returned unwrapped; nested `Multiple` values are
    /// flattened.
    #[must_use]
    pub fn multiple(errors: Vec<Self>) -> Self {
        let mut flat: Vec<Self> = Vec::with_capacity(errors.len());
        for error in errors {
            match error {
                Self::Multiple(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        if flat.len() == 1
            && let Some(only) = flat.pop()
        {
            return only;
        }
        Self::Multiple(flat)
    }

    /// Returns the individual errors, flattening `Multiple`.
    #[must_use]
    pub fn errors(&self) -> Vec<&Self> {
        match self {
            Self::Multiple(errors) => errors.iter().collect(),
            other => vec![other],
        }
    }
}

/// Errors raised by message store implementations.
#[derive(Debug, Clone, Error)]
pub enum MessageStoreError {
    /// The underlying storage failed.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),

    /// A stored row could not be converted to or from domain types.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// No connection to the storage backend could be obtained.
    #[error("connection error: {0}")]
    Connection(String),
}

impl MessageStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }
}

impl From<diesel::result::Error> for MessageStoreError {
    fn from(err: diesel::result::Error) -> Self {
        Self::persistence(err)
    }
}

//! Validator port for message drafts.
//!
//! Defines the abstract interface for validating drafts before they are
//! appended to the ledger.

use crate::message::{domain::MessageDraft, error::ValidationError};
use serde::{Deserialize, Serialize};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Port for message validation.
///
/// Implementations should collect all errors before returning rather than
/// failing fast, and combine them with [`ValidationError::multiple`].
pub trait MessageValidator: Send + Sync {
    /// Validates a draft against all rules.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any rule fails.
    fn validate(&self, draft: &MessageDraft) -> ValidationResult<()>;

    /// Validates only the payload of a draft.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the payload is invalid.
    fn validate_payload(&self, draft: &MessageDraft) -> ValidationResult<()>;

    /// Validates the metadata and hint of a draft.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if metadata or hint are invalid.
    fn validate_metadata(&self, draft: &MessageDraft) -> ValidationResult<()>;
}

/// Configuration for validation rules.
///
/// # Examples
///
/// ```
/// use parley::message::ports::validator::ValidationConfig;
///
/// let config = ValidationConfig::default();
/// assert!(!config.allow_empty_text);
///
/// let lenient = ValidationConfig::lenient();
/// assert!(lenient.allow_empty_text);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Maximum text length in characters.
    pub max_text_length: usize,
    /// Maximum serialised size of structured data in bytes.
    pub max_data_bytes: usize,
    /// Maximum file size in bytes.
    pub max_file_bytes: usize,
    /// Maximum number of metadata entries.
    pub max_metadata_entries: usize,
    /// Maximum hint length in characters.
    pub max_hint_length: usize,
    /// Whether chat messages may have empty text.
    pub allow_empty_text: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_text_length: 100_000,
            max_data_bytes: 1024 * 1024,      // 1 MiB
            max_file_bytes: 10 * 1024 * 1024, // 10 MiB
            max_metadata_entries: 64,
            max_hint_length: 1_024,
            allow_empty_text: false,
        }
    }
}

impl ValidationConfig {
    /// Creates a lenient configuration that allows empty text.
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            allow_empty_text: true,
            ..Default::default()
        }
    }

    /// Creates a strict configuration with reduced limits.
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            max_text_length: 10_000,
            max_data_bytes: 64 * 1024,
            max_file_bytes: 1024 * 1024,
            max_metadata_entries: 16,
            max_hint_length: 256,
            allow_empty_text: false,
        }
    }
}

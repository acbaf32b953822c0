//! Validation service implementation.
//!
//! Provides the default implementation of the `MessageValidator` port,
//! combining individual validation rules into a comprehensive validator.

use crate::message::{
    domain::MessageDraft,
    error::ValidationError,
    ports::validator::{MessageValidator, ValidationConfig, ValidationResult},
    validation::rules,
};

/// Default implementation of the message validator.
///
/// Applies all validation rules, collecting errors to provide comprehensive
/// feedback rather than failing on the first error.
///
/// # Examples
///
/// ```
/// use parley::message::domain::{MessageDraft, MessagePayload};
/// use parley::message::ports::validator::MessageValidator;
/// use parley::message::validation::DefaultMessageValidator;
/// use parley::tenancy::domain::WorkflowType;
/// use parley::thread::domain::ParticipantId;
///
/// let draft = MessageDraft::incoming(
///     ParticipantId::new("u1").expect("valid participant"),
///     WorkflowType::parse("Support:Chat").expect("valid type"),
///     MessagePayload::chat("Hello"),
/// );
///
/// let validator = DefaultMessageValidator::new();
/// assert!(validator.validate(&draft).is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct DefaultMessageValidator {
    config: ValidationConfig,
}

impl DefaultMessageValidator {
    /// Creates a new validator with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ValidationConfig::default(),
        }
    }

    /// Creates a new validator with custom configuration.
    #[must_use]
    pub const fn with_config(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Returns the current validation configuration.
    #[must_use]
    pub const fn config(&self) -> &ValidationConfig {
        &self.config
    }
}

impl Default for DefaultMessageValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageValidator for DefaultMessageValidator {
    fn validate(&self, draft: &MessageDraft) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = self.validate_payload(draft) {
            errors.push(e);
        }

        if let Err(e) = self.validate_metadata(draft) {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::multiple(errors))
        }
    }

    fn validate_payload(&self, draft: &MessageDraft) -> ValidationResult<()> {
        rules::validate_payload(draft, &self.config)
    }

    fn validate_metadata(&self, draft: &MessageDraft) -> ValidationResult<()> {
        rules::validate_metadata(draft, &self.config)
    }
}

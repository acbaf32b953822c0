//! Individual validation rule implementations.
//!
//! Each rule is a pure function over a draft. Rules return `Ok(())` on
//! success or a specific `ValidationError` on failure.

use crate::message::{
    domain::{FilePayload, MessageDraft, MessagePayload, WebhookPayload},
    error::ValidationError,
    ports::validator::ValidationConfig,
};
use serde_json::Value;

/// Validates the payload of a draft.
///
/// # Errors
///
/// Returns every payload violation, combined with
/// [`ValidationError::multiple`].
pub fn validate_payload(
    draft: &MessageDraft,
    config: &ValidationConfig,
) -> Result<(), ValidationError> {
    let mut errors = Vec::new();

    match draft.payload() {
        MessagePayload::Chat { text, data } => {
            collect(&mut errors, validate_chat_text(text, config));
            if let Some(value) = data {
                collect(&mut errors, validate_data_size(value, config));
            }
        }
        MessagePayload::Data { data, text } => {
            collect(&mut errors, validate_data_size(data, config));
            if let Some(value) = text {
                collect(&mut errors, validate_text_length(value, config));
            }
        }
        MessagePayload::File(file) => errors.extend(validate_file(file, config)),
        MessagePayload::Webhook(webhook) => errors.extend(validate_webhook(webhook, config)),
        MessagePayload::Handoff(handoff) => {
            collect(&mut errors, validate_text_length(&handoff.text, config));
            if let Some(value) = handoff.data.as_ref() {
                collect(&mut errors, validate_data_size(value, config));
            }
        }
    }

    finish(errors)
}

/// Validates metadata keys, the number of entries and the hint.
///
/// # Errors
///
/// Returns every metadata violation, combined with
/// [`ValidationError::multiple`].
pub fn validate_metadata(
    draft: &MessageDraft,
    config: &ValidationConfig,
) -> Result<(), ValidationError> {
    let mut errors = Vec::new();
    let metadata = draft.metadata();

    if metadata.len() > config.max_metadata_entries {
        errors.push(ValidationError::TooManyMetadataEntries {
            max: config.max_metadata_entries,
            actual: metadata.len(),
        });
    }

    for (key, _) in metadata.iter() {
        if key.trim().is_empty() {
            errors.push(ValidationError::InvalidMetadata(
                "metadata keys must not be blank".to_owned(),
            ));
        }
    }

    if let Some(hint) = draft.hint() {
        let length = hint.chars().count();
        if length > config.max_hint_length {
            errors.push(ValidationError::HintTooLong {
                max: config.max_hint_length,
                actual: length,
            });
        }
    }

    finish(errors)
}

fn validate_chat_text(text: &str, config: &ValidationConfig) -> Result<(), ValidationError> {
    if !config.allow_empty_text && text.trim().is_empty() {
        return Err(ValidationError::EmptyText);
    }
    validate_text_length(text, config)
}

fn validate_text_length(text: &str, config: &ValidationConfig) -> Result<(), ValidationError> {
    let length = text.chars().count();
    if length > config.max_text_length {
        return Err(ValidationError::TextTooLong {
            max: config.max_text_length,
            actual: length,
        });
    }
    Ok(())
}

fn validate_data_size(data: &Value, config: &ValidationConfig) -> Result<(), ValidationError> {
    let serialized = serde_json::to_vec(data).map_err(|err| {
        ValidationError::InvalidMetadata(format!("failed to serialize data: {err}"))
    })?;
    if serialized.len() > config.max_data_bytes {
        return Err(ValidationError::DataTooLarge {
            actual_bytes: serialized.len(),
            limit_bytes: config.max_data_bytes,
        });
    }
    Ok(())
}

fn validate_file(file: &FilePayload, config: &ValidationConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if file.content.is_empty() {
        errors.push(ValidationError::EmptyFile);
    }
    if file.content.len() > config.max_file_bytes {
        errors.push(ValidationError::FileTooLarge {
            actual_bytes: file.content.len(),
            limit_bytes: config.max_file_bytes,
        });
    }
    if let Some(caption) = file.text.as_deref() {
        collect(&mut errors, validate_text_length(caption, config));
    }
    errors
}

fn validate_webhook(webhook: &WebhookPayload, config: &ValidationConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if webhook.webhook_name.trim().is_empty() {
        errors.push(ValidationError::EmptyWebhookName);
    }
    if let Some(status) = webhook.status_code
        && !(100..=599).contains(&status)
    {
        errors.push(ValidationError::InvalidStatusCode(status));
    }
    collect(&mut errors, validate_data_size(&webhook.body, config));
    errors
}

fn collect(errors: &mut Vec<ValidationError>, result: Result<(), ValidationError>) {
    if let Err(error) = result {
        errors.push(error);
    }
}

fn finish(errors: Vec<ValidationError>) -> Result<(), ValidationError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::multiple(errors))
    }
}

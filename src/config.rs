//! Engine configuration.
//!
//! [`EngineConfig`] gathers the tunables of the routing engine: history
//! paging limits, transport retry policy, webhook and A2A timeouts, message
//! validation limits and the fallback reply sent when a handler fails.
//! Every section has sensible defaults, so a configuration file only needs
//! to name the values it overrides.
//!
//! # Examples
//!
//! ```
//! use parley::config::EngineConfig;
//!
//! let config = EngineConfig::from_toml_str(
//!     r#"
//!     [history]
//!     max_page_size = 50
//!
//!     [retry]
//!     max_attempts = 5
//!     "#,
//! )
//! .expect("valid configuration");
//!
//! assert_eq!(config.history.max_page_size, 50);
//! assert_eq!(config.retry.max_attempts, 5);
//! assert_eq!(config.webhook.default_timeout_seconds, 30);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::message::ports::validator::ValidationConfig;

/// Default fallback reply sent when a conversational handler fails.
pub const DEFAULT_FALLBACK_REPLY: &str =
    "Sorry, something went wrong while handling your message. Please try again.";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Paging limits for conversation history queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Page size used when the caller does not supply one.
    pub default_page_size: u32,
    /// Upper bound applied to every requested page size.
    pub max_page_size: u32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

impl HistoryConfig {
    /// Clamps a requested page size to the configured maximum.
    #[must_use]
    pub fn clamp_page_size(&self, requested: u32) -> u32 {
        requested.min(self.max_page_size)
    }
}

/// Exponential backoff policy for transport retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total number of transmission attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt, in milliseconds.
    pub initial_backoff_ms: u64,
    /// Upper bound on any single delay, in milliseconds.
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 2_000,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
        }
    }

    /// Returns the delay to wait after the given failed attempt (1-based).
    ///
    /// The delay doubles with each attempt and is capped at
    /// `max_backoff_ms`.
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32);
        let factor = 1_u64.checked_shl(exponent).unwrap_or(u64::MAX);
        let delay = self
            .initial_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms);
        Duration::from_millis(delay)
    }
}

/// Timeouts and bookkeeping for inbound webhook calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Time to wait for a handler response when the caller gives none.
    pub default_timeout_seconds: u64,
    /// Upper bound on any caller-supplied timeout.
    pub max_timeout_seconds: u64,
    /// Number of answered request ids remembered to reject duplicate
    /// responses.
    pub answered_retention: usize,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            default_timeout_seconds: 30,
            max_timeout_seconds: 300,
            answered_retention: 4_096,
        }
    }
}

impl WebhookConfig {
    /// Resolves the effective wait for a webhook call.
    #[must_use]
    pub fn effective_timeout(&self, requested_seconds: Option<u64>) -> Duration {
        let seconds = requested_seconds
            .filter(|value| *value > 0)
            .unwrap_or(self.default_timeout_seconds)
            .min(self.max_timeout_seconds);
        Duration::from_secs(seconds)
    }
}

/// Settings for agent-to-agent calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct A2aConfig {
    /// How long a caller waits for a correlated reply, in milliseconds.
    pub reply_timeout_ms: u64,
}

impl Default for A2aConfig {
    fn default() -> Self {
        Self {
            reply_timeout_ms: 60_000,
        }
    }
}

impl A2aConfig {
    /// Returns the reply timeout as a [`Duration`].
    #[must_use]
    pub const fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// History paging limits.
    pub history: HistoryConfig,
    /// Transport retry policy.
    pub retry: RetryPolicy,
    /// Webhook timeouts.
    pub webhook: WebhookConfig,
    /// Agent-to-agent call settings.
    pub a2a: A2aConfig,
    /// Message validation limits.
    pub validation: ValidationConfig,
    /// Reply sent to a participant when their message handler fails.
    pub fallback_reply: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history: HistoryConfig::default(),
            retry: RetryPolicy::default(),
            webhook: WebhookConfig::default(),
            a2a: A2aConfig::default(),
            validation: ValidationConfig::default(),
            fallback_reply: DEFAULT_FALLBACK_REPLY.to_owned(),
        }
    }
}

impl EngineConfig {
    /// Parses and validates a TOML configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] when a value is out of range.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Replaces the retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replaces the A2A settings.
    #[must_use]
    pub const fn with_a2a(mut self, a2a: A2aConfig) -> Self {
        self.a2a = a2a;
        self
    }

    /// Replaces the history limits.
    #[must_use]
    pub const fn with_history(mut self, history: HistoryConfig) -> Self {
        self.history = history;
        self
    }

    /// Replaces the webhook settings.
    #[must_use]
    pub const fn with_webhook(mut self, webhook: WebhookConfig) -> Self {
        self.webhook = webhook;
        self
    }

    /// Replaces the message validation limits.
    #[must_use]
    pub const fn with_validation(mut self, validation: ValidationConfig) -> Self {
        self.validation = validation;
        self
    }

    /// Replaces the fallback reply text.
    #[must_use]
    pub fn with_fallback_reply(mut self, reply: impl Into<String>) -> Self {
        self.fallback_reply = reply.into();
        self
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violated
    /// constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history.max_page_size == 0 {
            return Err(ConfigError::Invalid(
                "history.max_page_size must be positive".to_owned(),
            ));
        }
        if self.history.default_page_size == 0
            || self.history.default_page_size > self.history.max_page_size
        {
            return Err(ConfigError::Invalid(format!(
                "history.default_page_size must be between 1 and {}",
                self.history.max_page_size
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry.max_attempts must be at least 1".to_owned(),
            ));
        }
        if self.webhook.default_timeout_seconds > self.webhook.max_timeout_seconds {
            return Err(ConfigError::Invalid(
                "webhook.default_timeout_seconds exceeds webhook.max_timeout_seconds".to_owned(),
            ));
        }
        if self.webhook.answered_retention == 0 {
            return Err(ConfigError::Invalid(
                "webhook.answered_retention must be positive".to_owned(),
            ));
        }
        if self.validation.max_text_length == 0 {
            return Err(ConfigError::Invalid(
                "validation.max_text_length must be positive".to_owned(),
            ));
        }
        if self.fallback_reply.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "fallback_reply must not be empty".to_owned(),
            ));
        }
        Ok(())
    }
}

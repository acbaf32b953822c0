//! Error types for thread domain validation.

use crate::tenancy::domain::TenancyDomainError;
use std::fmt;
use thiserror::Error;

/// Component of a thread key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPart {
    /// The tenant identifier.
    Tenant,
    /// The workflow type.
    Workflow,
    /// The participant identifier.
    Participant,
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tenant => "tenant",
            Self::Workflow => "workflow",
            Self::Participant => "participant",
        })
    }
}

/// Errors returned while constructing thread domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ThreadDomainError {
    /// A key part is empty after trimming.
    #[error("thread key {0} must not be empty")]
    EmptyKeyPart(KeyPart),

    /// A key part failed tenancy validation.
    #[error("invalid thread key: {0}")]
    InvalidKeyPart(#[from] TenancyDomainError),

    /// A named scope was constructed from a blank string.
    #[error("named scope must not be blank")]
    BlankScope,
}

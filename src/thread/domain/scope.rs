//! Scopes partition a thread into isolated sub-conversations.

use super::{ThreadDomainError, ThreadId};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A scope label, or the distinguished null scope.
///
/// The null scope is a bucket of its own. It is never a wildcard and never
/// matches a named scope.
///
/// # Examples
///
/// ```
/// use parley::thread::domain::Scope;
///
/// assert!(Scope::parse(None).is_null());
/// assert!(Scope::parse(Some("  ")).is_null());
///
/// let billing = Scope::named("billing").expect("valid scope");
/// assert_eq!(billing.as_option(), Some("billing"));
/// assert_ne!(billing, Scope::null());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope(Option<String>);

impl Scope {
    /// Returns the null scope.
    #[must_use]
    pub const fn null() -> Self {
        Self(None)
    }

    /// Creates a named scope.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadDomainError::BlankScope`] when the label is blank.
    pub fn named(label: impl Into<String>) -> Result<Self, ThreadDomainError> {
        let raw = label.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ThreadDomainError::BlankScope);
        }
        Ok(Self(Some(trimmed.to_owned())))
    }

    /// Parses a scope received at an edge, mapping absent or blank to null.
    #[must_use]
    pub fn parse(label: Option<&str>) -> Self {
        label
            .map(str::trim)
            .filter(|trimmed| !trimmed.is_empty())
            .map_or_else(Self::null, |trimmed| Self(Some(trimmed.to_owned())))
    }

    /// Returns the label, or `None` for the null scope.
    #[must_use]
    pub fn as_option(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Returns `true` for the null scope.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.0.is_none()
    }

    /// Returns a string that distinguishes every scope, including null.
    #[must_use]
    pub fn discriminant(&self) -> String {
        match &self.0 {
            None => "null".to_owned(),
            Some(label) => format!("named:{label}"),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            None => f.write_str("<null>"),
            Some(label) => f.write_str(label),
        }
    }
}

/// Deterministic identifier of a (thread, scope) bucket.
///
/// Derived as a UUID v5 in the namespace of the thread id, so the same
/// pair always maps to the same bucket across processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeBucketId(Uuid);

impl ScopeBucketId {
    /// Derives the bucket identifier for `scope` within `thread_id`.
    #[must_use]
    pub fn derive(thread_id: ThreadId, scope: &Scope) -> Self {
        Self(Uuid::new_v5(
            thread_id.as_ref(),
            scope.discriminant().as_bytes(),
        ))
    }

    /// Creates a bucket identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID value.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl fmt::Display for ScopeBucketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

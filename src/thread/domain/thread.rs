//! Thread aggregate.

use super::{ThreadId, ThreadKey};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// A conversation thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    id: ThreadId,
    key: ThreadKey,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted thread.
#[derive(Debug, Clone)]
pub struct PersistedThreadData {
    /// Thread identifier.
    pub id: ThreadId,
    /// Identity triple.
    pub key: ThreadKey,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Thread {
    /// Creates a new thread for `key`.
    #[must_use]
    pub fn new(key: ThreadKey, clock: &(impl Clock + ?Sized)) -> Self {
        Self {
            id: ThreadId::new(),
            key,
            created_at: clock.utc(),
        }
    }

    /// Reconstructs a thread from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedThreadData) -> Self {
        Self {
            id: data.id,
            key: data.key,
            created_at: data.created_at,
        }
    }

    /// Returns the thread identifier.
    #[must_use]
    pub const fn id(&self) -> ThreadId {
        self.id
    }

    /// Returns the identity triple.
    #[must_use]
    pub const fn key(&self) -> &ThreadKey {
        &self.key
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

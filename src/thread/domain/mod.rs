//! Domain model for threads and scopes.

mod error;
mod ids;
mod key;
mod scope;
mod thread;

pub use error::{KeyPart, ThreadDomainError};
pub use ids::{ParticipantId, ThreadId};
pub use key::ThreadKey;
pub use scope::{Scope, ScopeBucketId};
pub use thread::{PersistedThreadData, Thread};

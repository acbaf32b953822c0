//! Append-only message ledger partitioned by scope.
//!
//! Every message belongs to exactly one (thread, scope) bucket. Within a
//! bucket messages are numbered 1, 2, 3, ... in append order and are never
//! updated or deleted. The null scope is a bucket of its own, not a
//! wildcard over named scopes.
//!
//! # Architecture
//!
//! - **Domain**: [`domain::Message`], [`domain::MessageDraft`] and the tagged
//!   [`domain::MessagePayload`]
//! - **Ports**: [`ports::MessageStore`] and [`ports::MessageValidator`]
//! - **Adapters**: [`adapters::memory::InMemoryMessageStore`] and
//!   [`adapters::postgres::PostgresMessageStore`]
//! - **Validation**: limits enforced before a draft is stored
//! - **Services**: [`services::ScopeIndex`] and [`services::HintOverlay`]
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use parley::clock::system_clock;
//! use parley::config::HistoryConfig;
//! use parley::message::adapters::memory::InMemoryMessageStore;
//! use parley::message::domain::{MessageDraft, MessagePayload};
//! use parley::message::services::ScopeIndex;
//! use parley::message::validation::DefaultMessageValidator;
//! use parley::tenancy::domain::WorkflowType;
//! use parley::thread::domain::{ParticipantId, Scope, ThreadId};
//!
//! # tokio::runtime::Runtime::new().expect("runtime").block_on(async {
//! let index = ScopeIndex::new(
//!     Arc::new(InMemoryMessageStore::new(system_clock())),
//!     Arc::new(DefaultMessageValidator::new()),
//!     HistoryConfig::default(),
//! );
//! let thread_id = ThreadId::new();
//! let draft = MessageDraft::incoming(
//!     ParticipantId::new("u1").expect("valid participant"),
//!     WorkflowType::parse("Support:Chat").expect("valid type"),
//!     MessagePayload::chat("Hello"),
//! );
//!
//! let (_, message) = index
//!     .place(thread_id, &Scope::null(), draft)
//!     .await
//!     .expect("placed");
//! assert_eq!(message.sequence_number().value(), 1);
//! # });
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod services;
pub mod validation;

#[cfg(test)]
mod tests;

//! Domain model for the message ledger.
//!
//! Contains the [`Message`] aggregate, its tagged [`MessagePayload`], the
//! draft used to append new messages, and the paging types used by history
//! queries. All types here are free of infrastructure concerns.

mod ids;
mod message;
mod metadata;
mod page;
mod payload;

pub use ids::{MessageId, RequestId, SequenceNumber};
pub use message::{Direction, Message, MessageDraft, MessageOrigin, PersistedMessageData};
pub use metadata::{AuthorizationFingerprint, MessageMetadata};
pub use page::{HistoryPage, PageRequest, PageRequestError};
pub use payload::{
    FilePayload, HandoffPayload, MessagePayload, MessageType, ParseMessageTypeError,
    WebhookPayload,
};

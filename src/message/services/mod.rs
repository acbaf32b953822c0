//! Application services for the message subsystem.
//!
//! [`ScopeIndex`] validates and places drafts into (thread, scope) buckets
//! and pages through their history. [`HintOverlay`] reads and writes the
//! per-bucket hint register.

mod hint_overlay;
mod scope_index;

pub use hint_overlay::{HintOverlay, HintOverlayError};
pub use scope_index::{ScopeIndex, ScopeIndexError, ScopeIndexResult};

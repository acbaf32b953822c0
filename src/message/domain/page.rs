//! Paging types for history queries.

use super::Message;
use thiserror::Error;

/// Rejected page parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PageRequestError {
    /// Pages are 1-indexed.
    #[error("page numbers start at 1")]
    ZeroPage,
    /// A page must hold at least one message.
    #[error("page size must be at least 1")]
    ZeroPageSize,
}

/// A validated, 1-indexed page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Creates a page request.
    ///
    /// # Errors
    ///
    /// Returns [`PageRequestError`] when `page` or `page_size` is zero.
    pub const fn new(page: u32, page_size: u32) -> Result<Self, PageRequestError> {
        if page == 0 {
            return Err(PageRequestError::ZeroPage);
        }
        if page_size == 0 {
            return Err(PageRequestError::ZeroPageSize);
        }
        Ok(Self { page, page_size })
    }

    /// Returns the 1-indexed page number.
    #[must_use]
    pub const fn page(self) -> u32 {
        self.page
    }

    /// Returns the page size.
    #[must_use]
    pub const fn page_size(self) -> u32 {
        self.page_size
    }

    /// Returns the number of newest messages to skip.
    #[must_use]
    pub fn offset(self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }
}

/// One page of history, newest message first.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPage {
    /// Messages on this page in reverse append order.
    pub messages: Vec<Message>,
    /// The page number that was requested.
    pub page: u32,
    /// The effective page size after clamping.
    pub page_size: u32,
    /// Whether older messages exist beyond this page.
    pub has_more: bool,
}

impl HistoryPage {
    /// Returns the texts of the messages on this page, in page order.
    #[must_use]
    pub fn texts(&self) -> Vec<&str> {
        self.messages
            .iter()
            .filter_map(|message| message.payload().text())
            .collect()
    }
}

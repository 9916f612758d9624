//! Pagination types and traits

use crate::http::QueryParams;

/// Whether a listing has more pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextPage {
    Continue,
    Done,
}

impl NextPage {
    pub fn is_done(self) -> bool {
        self == Self::Done
    }
}

/// Progress through one listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaginationState {
    /// Page to request next; `None` until the first page was processed
    pub page: Option<u32>,
    /// Listing calls answered so far
    pub pages_fetched: u32,
    /// Items across all answered calls
    pub items_seen: u64,
}

impl PaginationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one answered listing call of `count` items
    pub fn record(&mut self, count: usize) {
        self.pages_fetched += 1;
        self.items_seen += count as u64;
    }

    /// Nothing was answered yet
    pub fn is_first_page(&self) -> bool {
        self.pages_fetched == 0
    }
}

/// Decides listing query parameters and when a listing is exhausted
pub trait Paginator: Send + Sync {
    /// Query parameters for the call about to be made
    fn page_params(&self, state: &PaginationState) -> QueryParams;

    /// Account for a page of `count` items and decide whether to fetch another
    fn process_page(&self, count: usize, state: &mut PaginationState) -> NextPage;
}

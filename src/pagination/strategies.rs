//! Pagination strategy implementations

use super::types::{NextPage, PaginationState, Paginator};
use crate::http::QueryParams;

// ============================================================================
// Page Number Pagination
// ============================================================================

/// Page number pagination
///
/// Sends `limit=S&page=N`, starting at `start_page` and advancing by one.
/// A page shorter than `S` (including an empty one) is the last page.
#[derive(Debug, Clone)]
pub struct PageNumberPaginator {
    pub page_param: String,
    /// First page number (Agora listings start at 1)
    pub start_page: u32,
    pub page_size_param: String,
    pub page_size: u32,
}

impl PageNumberPaginator {
    pub fn new(page_param: impl Into<String>, start_page: u32) -> Self {
        Self {
            page_param: page_param.into(),
            start_page,
            page_size_param: "limit".to_string(),
            page_size: 100,
        }
    }

    #[must_use]
    pub fn with_page_size(mut self, param: impl Into<String>, size: u32) -> Self {
        self.page_size_param = param.into();
        self.page_size = size;
        self
    }

    fn current_page(&self, state: &PaginationState) -> u32 {
        state.page.unwrap_or(self.start_page)
    }
}

impl Paginator for PageNumberPaginator {
    fn page_params(&self, state: &PaginationState) -> QueryParams {
        vec![
            (self.page_size_param.clone(), self.page_size.to_string()),
            (self.page_param.clone(), self.current_page(state).to_string()),
        ]
    }

    fn process_page(&self, count: usize, state: &mut PaginationState) -> NextPage {
        let answered = self.current_page(state);
        state.record(count);

        if count < self.page_size as usize {
            return NextPage::Done;
        }
        state.page = Some(answered + 1);
        NextPage::Continue
    }
}

// ============================================================================
// Single Request
// ============================================================================

/// One listing call per pass, optionally capped with a page size
#[derive(Debug, Clone, Default)]
pub struct SingleRequestPaginator {
    pub page_size: Option<(String, u32)>,
}

impl SingleRequestPaginator {
    pub fn with_page_size(param: impl Into<String>, size: u32) -> Self {
        Self {
            page_size: Some((param.into(), size)),
        }
    }
}

impl Paginator for SingleRequestPaginator {
    fn page_params(&self, _state: &PaginationState) -> QueryParams {
        self.page_size
            .iter()
            .map(|(param, size)| (param.clone(), size.to_string()))
            .collect()
    }

    fn process_page(&self, count: usize, state: &mut PaginationState) -> NextPage {
        state.record(count);
        NextPage::Done
    }
}

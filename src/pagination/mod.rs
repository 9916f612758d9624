//! Pagination module
//!
//! Supports: Page Number (with short-page termination), Single Request
//!
//! # Overview
//!
//! A paginator decides the query parameters for the next listing call and,
//! given how many items the last call returned, whether another call is
//! needed. The remote API exposes no total count or next link, so the only
//! signal is page fullness.

mod strategies;
mod types;

pub use strategies::{PageNumberPaginator, SingleRequestPaginator};
pub use types::{NextPage, PaginationState, Paginator};

#[cfg(test)]
mod tests;

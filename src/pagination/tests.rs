//! Tests for pagination module

use super::*;

fn param<'a>(params: &'a crate::http::QueryParams, key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

// ============================================================================
// NextPage / PaginationState Tests
// ============================================================================

#[test]
fn test_next_page_predicates() {
    assert!(!NextPage::Continue.is_done());
    assert!(NextPage::Done.is_done());
}

#[test]
fn test_pagination_state_default() {
    let mut state = PaginationState::new();
    assert_eq!(state.page, None);
    assert!(state.is_first_page());

    state.record(7);
    assert!(!state.is_first_page());
    assert_eq!(state.items_seen, 7);
}

// ============================================================================
// PageNumberPaginator Tests
// ============================================================================

#[test]
fn test_page_number_starts_at_one() {
    let paginator = PageNumberPaginator::new("page", 1).with_page_size("limit", 100);
    let state = PaginationState::new();

    let params = paginator.page_params(&state);
    assert_eq!(param(&params, "page"), Some("1"));
    assert_eq!(param(&params, "limit"), Some("100"));
}

#[test]
fn test_page_number_advances_by_one_on_full_pages() {
    let paginator = PageNumberPaginator::new("page", 1).with_page_size("limit", 3);
    let mut state = PaginationState::new();

    let mut requested = Vec::new();
    for count in [3, 3, 3, 1] {
        requested.push(param(&paginator.page_params(&state), "page").unwrap().to_string());
        if paginator.process_page(count, &mut state).is_done() {
            break;
        }
    }

    assert_eq!(requested, vec!["1", "2", "3", "4"]);
    assert_eq!(state.pages_fetched, 4);
    assert_eq!(state.items_seen, 10);
    assert_eq!(state.page, Some(4));
}

#[test]
fn test_page_number_stops_on_empty_first_page() {
    let paginator = PageNumberPaginator::new("page", 1).with_page_size("limit", 100);
    let mut state = PaginationState::new();

    assert!(paginator.process_page(0, &mut state).is_done());
    assert_eq!(state.pages_fetched, 1);
}

#[test]
fn test_page_number_stops_on_empty_page_after_full_one() {
    let paginator = PageNumberPaginator::new("page", 1).with_page_size("limit", 2);
    let mut state = PaginationState::new();

    assert!(!paginator.process_page(2, &mut state).is_done());
    assert_eq!(param(&paginator.page_params(&state), "page"), Some("2"));
    assert!(paginator.process_page(0, &mut state).is_done());
}

// ============================================================================
// SingleRequestPaginator Tests
// ============================================================================

#[test]
fn test_single_request_always_done() {
    let paginator = SingleRequestPaginator::with_page_size("limit", 100);
    let mut state = PaginationState::new();

    let params = paginator.page_params(&state);
    assert_eq!(param(&params, "limit"), Some("100"));
    assert_eq!(param(&params, "page"), None);

    assert!(paginator.process_page(100, &mut state).is_done());
    assert_eq!(state.pages_fetched, 1);
}

#[test]
fn test_single_request_without_limit() {
    let paginator = SingleRequestPaginator::default();
    assert!(paginator.page_params(&PaginationState::new()).is_empty());
}

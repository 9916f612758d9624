//! Window resolution and cursor tracking
//!
//! A pass queries `[start, today]` where `start` comes from the stored
//! checkpoint when there is one. Items are filtered against the running
//! maximum, which starts at the checkpoint and moves with every kept item.

use super::types::SyncState;
use crate::types::Position;
use chrono::{DateTime, NaiveDate, Utc};

/// Date format of the `from`/`to` query parameters
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Query window of one pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncWindow {
    /// First calendar day queried (inclusive)
    pub start: NaiveDate,
    /// Last calendar day queried (inclusive, always today)
    pub end: NaiveDate,
    /// Incoming checkpoint position; 0 when there is none
    pub boundary: Position,
}

impl SyncWindow {
    /// Start day formatted for the query string
    pub fn from_param(&self) -> String {
        self.start.format(DATE_FORMAT).to_string()
    }

    /// End day formatted for the query string
    pub fn to_param(&self) -> String {
        self.end.format(DATE_FORMAT).to_string()
    }
}

/// Window plus an optional warning about the stored checkpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedWindow {
    pub window: SyncWindow,
    /// Set when a stored value was present but unusable
    pub warning: Option<String>,
}

/// Compute the query window from prior state or the configured start date
///
/// An unusable stored value never fails the pass: the window falls back to
/// `start_date` with no boundary, and the reason is returned as a warning.
pub fn resolve_window(
    incoming: Option<&SyncState>,
    cursor_field: &str,
    start_date: NaiveDate,
    now: DateTime<Utc>,
) -> ResolvedWindow {
    let end = now.date_naive();
    let fallback = SyncWindow {
        start: start_date,
        end,
        boundary: 0,
    };

    let Some(state) = incoming else {
        return ResolvedWindow {
            window: fallback,
            warning: None,
        };
    };

    match state.position(cursor_field) {
        Ok(None) | Ok(Some(0)) => ResolvedWindow {
            window: fallback,
            warning: None,
        },
        Ok(Some(position)) => match DateTime::<Utc>::from_timestamp_millis(position) {
            Some(at) => ResolvedWindow {
                window: SyncWindow {
                    start: at.date_naive(),
                    end,
                    boundary: position,
                },
                warning: None,
            },
            None => ResolvedWindow {
                window: fallback,
                warning: Some(format!(
                    "Stored {cursor_field} {position} is out of range, syncing from {start_date}"
                )),
            },
        },
        Err(e) => ResolvedWindow {
            window: fallback,
            warning: Some(format!("{e}, syncing from {start_date}")),
        },
    }
}

/// Forward-only filter over item positions
///
/// An item is discarded when the running maximum is nonzero and the item's
/// position is at or below it.
#[derive(Debug, Clone)]
pub struct CursorTracker {
    boundary: Position,
    max: Position,
    evaluated: u64,
    kept: u64,
}

impl CursorTracker {
    /// Create a tracker starting at the incoming checkpoint (0 if none)
    pub fn new(boundary: Position) -> Self {
        Self {
            boundary,
            max: boundary,
            evaluated: 0,
            kept: 0,
        }
    }

    /// Check if a position is at or below the running maximum
    pub fn is_behind(&self, position: Position) -> bool {
        self.max != 0 && position <= self.max
    }

    /// Evaluate one item; returns whether it should be emitted
    pub fn observe(&mut self, position: Position) -> bool {
        self.evaluated += 1;
        if self.is_behind(position) {
            return false;
        }
        self.kept += 1;
        if position > self.max {
            self.max = position;
        }
        true
    }

    /// Running maximum
    pub fn max(&self) -> Position {
        self.max
    }

    /// Check if the running maximum moved past the incoming checkpoint
    pub fn advanced(&self) -> bool {
        self.max > self.boundary
    }

    /// Number of items evaluated
    pub fn evaluated(&self) -> u64 {
        self.evaluated
    }

    /// Number of items kept
    pub fn kept(&self) -> u64 {
        self.kept
    }
}

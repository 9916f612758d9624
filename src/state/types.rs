//! State types for tracking sync progress
//!
//! These types are serialized to JSON and persisted between runs.

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue, Position};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Complete state for a connector
///
/// Serialized as `{"data": {<stream>: {<cursor-field>: <epoch-ms>}}}`, the
/// same payload a `STATE` message carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Per-stream checkpoints
    #[serde(default)]
    pub data: BTreeMap<String, SyncState>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the checkpoint of a stream
    pub fn get_stream(&self, stream: &str) -> Option<&SyncState> {
        self.data.get(stream)
    }

    /// Replace the checkpoint of a stream wholesale
    pub fn set_stream(&mut self, stream: &str, state: SyncState) {
        self.data.insert(stream.to_string(), state);
    }

    /// Check if no stream has a checkpoint
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Checkpoint of a single stream
///
/// Kept as the raw JSON object so a malformed stored value can be reported
/// instead of failing deserialization of the whole state file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncState(JsonObject);

impl SyncState {
    /// Create an empty checkpoint
    pub fn new() -> Self {
        Self::default()
    }

    /// Checkpoint holding a single cursor position
    pub fn at(cursor_field: &str, position: Position) -> Self {
        let mut values = JsonObject::new();
        values.insert(cursor_field.to_string(), JsonValue::from(position));
        Self(values)
    }

    /// Check if no cursor value is stored
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw stored value of a cursor field
    pub fn raw(&self, cursor_field: &str) -> Option<&JsonValue> {
        self.0.get(cursor_field)
    }

    /// Stored position of a cursor field, in epoch milliseconds
    ///
    /// Accepts a JSON number or a numeric string. Returns `Ok(None)` when the
    /// field is absent or null, and a state error when the value cannot be a
    /// position.
    pub fn position(&self, cursor_field: &str) -> Result<Option<Position>> {
        let value = match self.0.get(cursor_field) {
            None | Some(JsonValue::Null) => return Ok(None),
            Some(value) => value,
        };

        let parsed = match value {
            JsonValue::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
            JsonValue::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };

        match parsed {
            Some(position) if position >= 0 => Ok(Some(position)),
            _ => Err(Error::state(format!(
                "Stored {cursor_field} value {value} is not a valid position"
            ))),
        }
    }
}

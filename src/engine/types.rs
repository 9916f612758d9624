//! Engine types
//!
//! Protocol messages and statistics for the sync engine.

use crate::state::{State, SyncState};
use crate::types::{JsonObject, JsonValue, LogLevel};
use serde::{Deserialize, Serialize};

/// A message emitted on the output stream
///
/// Serialized with a `type` tag, one JSON document per line:
/// `{"type":"RECORD","record":{...}}`, `{"type":"STATE","state":{...}}`,
/// `{"type":"LOG","level":"INFO","message":"..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// One record of a stream
    Record { record: RecordMessage },
    /// Checkpoint of one or more streams
    State { state: State },
    /// Diagnostic
    Log { level: LogLevel, message: String },
    /// Connector specification
    Spec { spec: SpecMessage },
    /// Result of a connection check
    ConnectionStatus {
        #[serde(rename = "connectionStatus")]
        connection_status: ConnectionStatus,
    },
    /// Stream catalog
    Catalog { catalog: Catalog },
}

/// Payload of a `RECORD` message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMessage {
    pub stream: String,
    pub data: JsonObject,
    /// Emission time, epoch milliseconds
    pub emitted_at: i64,
}

/// Payload of a `SPEC` message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecMessage {
    #[serde(rename = "connectionSpecification")]
    pub connection_specification: JsonValue,
}

/// Outcome of a connection check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    Succeeded,
    Failed,
}

/// Payload of a `CONNECTION_STATUS` message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub status: CheckStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Payload of a `CATALOG` message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub streams: Vec<JsonValue>,
}

impl Message {
    /// Create a record message
    pub fn record(stream: impl Into<String>, data: JsonObject, emitted_at: i64) -> Self {
        Self::Record {
            record: RecordMessage {
                stream: stream.into(),
                data,
                emitted_at,
            },
        }
    }

    /// Create a checkpoint message for a single stream
    pub fn state(stream: &str, sync_state: SyncState) -> Self {
        let mut state = State::new();
        state.set_stream(stream, sync_state);
        Self::State { state }
    }

    /// Create a log message
    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        Self::Log {
            level,
            message: message.into(),
        }
    }

    /// Create an info log
    pub fn info(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Info, message)
    }

    /// Create a warning log
    pub fn warn(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Warn, message)
    }

    /// Create an error log
    pub fn error(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Error, message)
    }

    /// Create a connection status message
    pub fn connection_status(status: CheckStatus, message: impl Into<String>) -> Self {
        Self::ConnectionStatus {
            connection_status: ConnectionStatus {
                status,
                message: Some(message.into()),
            },
        }
    }

    /// Check if this is a record message
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }

    /// Check if this is a state message
    pub fn is_state(&self) -> bool {
        matches!(self, Self::State { .. })
    }

    /// Check if this is a log message
    pub fn is_log(&self) -> bool {
        matches!(self, Self::Log { .. })
    }
}

/// Statistics from sync operations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Remote calls issued (listing and detail)
    pub requests: u64,
    /// Listing pages fetched
    pub pages_fetched: u64,
    /// Detail responses fetched
    pub details_fetched: u64,
    /// Candidates evaluated by the cursor tracker
    pub candidates_evaluated: u64,
    /// Candidates discarded as already replicated or unusable
    pub candidates_skipped: u64,
    /// Parents skipped without a detail request
    pub parents_skipped: u64,
    /// Record messages emitted
    pub records_emitted: u64,
    /// Passes completed successfully
    pub streams_synced: u64,
    /// Passes that failed
    pub errors: u64,
    /// Duration of the last pass in milliseconds
    pub duration_ms: u64,
}

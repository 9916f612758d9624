//! Common types used throughout the connector
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// Position of an item on the replication timeline, in epoch milliseconds
pub type Position = i64;

// ============================================================================
// Log Level
// ============================================================================

/// Severity of a diagnostic message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

// ============================================================================
// Cursor Unit
// ============================================================================

/// Native resolution of the timestamps a stream reads from the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorUnit {
    /// Unix timestamp (seconds)
    #[default]
    Seconds,
    /// Unix timestamp (milliseconds)
    Milliseconds,
}

impl CursorUnit {
    /// Normalize a native value to epoch milliseconds
    pub fn to_millis(self, value: i64) -> Position {
        match self {
            CursorUnit::Seconds => value.saturating_mul(1000),
            CursorUnit::Milliseconds => value,
        }
    }
}

// ============================================================================
// Backoff Type
// ============================================================================

/// Type of backoff for retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}

// ============================================================================
// Sync Mode
// ============================================================================

/// Synchronization modes a stream advertises in its catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Fetch everything from the configured start date
    FullRefresh,
    /// Only fetch data past the last checkpoint
    Incremental,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_unit_to_millis() {
        assert_eq!(CursorUnit::Seconds.to_millis(1_620_000_000), 1_620_000_000_000);
        assert_eq!(
            CursorUnit::Milliseconds.to_millis(1_620_000_000_000),
            1_620_000_000_000
        );
        assert_eq!(CursorUnit::Seconds.to_millis(i64::MAX), i64::MAX);
    }

    #[test]
    fn test_log_level_serde() {
        assert_eq!(serde_json::to_string(&LogLevel::Warn).unwrap(), "\"WARN\"");
        let level: LogLevel = serde_json::from_str("\"ERROR\"").unwrap();
        assert_eq!(level, LogLevel::Error);
    }

    #[test]
    fn test_log_level_to_tracing() {
        assert_eq!(tracing::Level::from(LogLevel::Info), tracing::Level::INFO);
        assert_eq!(tracing::Level::from(LogLevel::Error), tracing::Level::ERROR);
    }

    #[test]
    fn test_sync_mode_serde() {
        let json = serde_json::to_string(&SyncMode::FullRefresh).unwrap();
        assert_eq!(json, "\"full_refresh\"");
    }
}

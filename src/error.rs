//! Error types for the Agora source connector
//!
//! All public APIs return `Result<T, Error>`. Errors fall into three groups:
//! configuration problems (fatal before any stream runs), transport problems
//! talking to the Agora REST API (fatal for the current pass), and local
//! problems with state or output.

use thiserror::Error;

/// The main error type for the connector
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration
    // ============================================================================
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    #[error("Missing required config field '{field}'")]
    MissingConfigField { field: String },

    #[error("Invalid value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Malformed JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Stream '{stream}' is not supported")]
    StreamNotFound { stream: String },

    // ============================================================================
    // Transport
    // ============================================================================
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Agora API returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Throttled by the API, retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    #[error("No response within {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Gave up after {max_retries} retries")]
    MaxRetriesExceeded { max_retries: u32 },

    #[error("Unexpected response: {message}")]
    Decode { message: String },

    // ============================================================================
    // Local
    // ============================================================================
    #[error("Checkpoint error: {message}")]
    State { message: String },

    #[error("Cannot write message: {message}")]
    Output { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stream '{stream}' failed: {source}")]
    StreamFailed {
        stream: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Attach the name of the stream (or streams) whose pass failed
    pub fn stream_failed(stream: impl Into<String>, source: Error) -> Self {
        Self::StreamFailed {
            stream: stream.into(),
            source: Box::new(source),
        }
    }

    /// Whether the same request could succeed if sent again
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            Error::RateLimited { .. } | Error::Timeout { .. } => true,
            Error::HttpStatus { status, .. } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }

    /// Whether the error came from talking to the remote API
    pub fn is_transport(&self) -> bool {
        match self {
            Error::Http(_)
            | Error::HttpStatus { .. }
            | Error::RateLimited { .. }
            | Error::Timeout { .. }
            | Error::MaxRetriesExceeded { .. }
            | Error::Decode { .. } => true,
            Error::StreamFailed { source, .. } => source.is_transport(),
            _ => false,
        }
    }

    /// Whether the error is a configuration problem
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Error::Config { .. }
                | Error::MissingConfigField { .. }
                | Error::InvalidConfigValue { .. }
                | Error::InvalidUrl(_)
                | Error::StreamNotFound { .. }
        )
    }
}

/// Result type alias for the connector
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::missing_field("app_id").to_string(),
            "Missing required config field 'app_id'"
        );
        assert_eq!(
            Error::http_status(404, "Not found").to_string(),
            "Agora API returned HTTP 404: Not found"
        );
    }

    #[test_case(429 => true ; "throttled")]
    #[test_case(500 => true ; "internal error")]
    #[test_case(524 => true ; "edge timeout")]
    #[test_case(400 => false ; "bad request")]
    #[test_case(401 => false ; "unauthorized")]
    #[test_case(404 => false ; "not found")]
    fn test_status_retryable(status: u16) -> bool {
        Error::http_status(status, "").is_retryable()
    }

    #[test]
    fn test_is_retryable() {
        assert!(Error::RateLimited {
            retry_after_seconds: 60
        }
        .is_retryable());
        assert!(Error::Timeout { timeout_ms: 1000 }.is_retryable());
        assert!(!Error::config("test").is_retryable());
        assert!(!Error::decode("not an array").is_retryable());
    }

    #[test]
    fn test_classification() {
        assert!(Error::http_status(502, "").is_transport());
        assert!(!Error::http_status(502, "").is_config());
        assert!(Error::missing_field("start_date").is_config());
        assert!(!Error::state("bad").is_transport());

        let wrapped = Error::stream_failed("events", Error::http_status(500, "boom"));
        assert!(wrapped.is_transport());
        assert_eq!(
            wrapped.to_string(),
            "Stream 'events' failed: Agora API returned HTTP 500: boom"
        );
    }
}

// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Agora Source
//!
//! Incremental replication of Agora REST API data as a stream of
//! newline-delimited protocol messages.
//!
//! ## Streams
//!
//! - **usage**: daily resource consumption, one record per region and resource
//! - **call_quality**: per-user quality metrics of each call
//! - **recordings**: cloud recording sessions
//! - **channels**: channel lifetimes and peak concurrency
//! - **events**: platform events and errors
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use agora_source::auth::AuthConfig;
//! use agora_source::engine::SyncEngine;
//! use agora_source::http::{HttpClient, HttpClientConfig};
//! use agora_source::output::JsonLinesWriter;
//! use agora_source::streams::StreamName;
//!
//! let config = ConnectorConfig::from_value(raw)?.validate()?;
//! let client = HttpClient::new(HttpClientConfig::default(), AuthConfig::agora(&config))?;
//! let mut engine = SyncEngine::new(client, &config.app_id, config.start_date);
//! let mut out = JsonLinesWriter::stdout();
//!
//! let checkpoint = engine
//!     .sync_stream(&StreamName::Usage.descriptor(), None, &mut out)
//!     .await?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │   CLI: spec / check / discover / read       (StateManager)   │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//! ┌──────────────────────────────────────────────────────────────┐
//! │   SyncEngine::sync_stream(descriptor, checkpoint, sink)      │
//! └──────────────────────────────────────────────────────────────┘
//!          │                 │                  │
//! ┌────────┴───────┬─────────┴────────┬─────────┴───────┬─────────┐
//! │ HTTP + Auth    │ Paginate         │ Streams         │ Output  │
//! ├────────────────┼──────────────────┼─────────────────┼─────────┤
//! │ Retry/Backoff  │ Page number      │ Descriptors     │ JSONL   │
//! │ Rate limit     │ Single request   │ Projections     │ Memory  │
//! │ Basic + App ID │                  │ Record identity │         │
//! └────────────────┴──────────────────┴─────────────────┴─────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Connector configuration and validation
pub mod config;

/// Agora request authentication
pub mod auth;

/// HTTP client with retry and rate limiting
pub mod http;

/// Pagination strategies
pub mod pagination;

/// Checkpoints, sync windows and state persistence
pub mod state;

/// Deterministic record identities
pub mod identity;

/// Stream descriptors and projections
pub mod streams;

/// Protocol message sinks
pub mod output;

/// Main execution engine
pub mod engine;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use config::{ConnectorConfig, SourceConfig};
pub use engine::{Message, SyncEngine};
pub use streams::{StreamDescriptor, StreamName};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

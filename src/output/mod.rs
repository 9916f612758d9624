//! Output module
//!
//! Writes protocol messages to the process output stream.
//!
//! # Overview
//!
//! This module provides:
//! - `MessageSink` - Append-only destination for messages
//! - `JsonLinesWriter` - One JSON document per line, flushed per message
//! - `MemorySink` - Collects messages in memory for inspection

mod writer;

pub use writer::{JsonLinesWriter, MemorySink, MessageSink};

//! CLI module
//!
//! Command-line interface for the connector.
//!
//! # Commands
//!
//! - `spec` - Print the configuration specification
//! - `check` - Validate config and test the connection
//! - `discover` - List available streams
//! - `read` - Extract data from streams

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;

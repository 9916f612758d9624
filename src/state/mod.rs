//! State management module
//!
//! Handles cursor tracking, checkpointing, and resumability.
//! State is persisted between sync runs to enable incremental syncs.
//!
//! # Overview
//!
//! The state module provides:
//! - `SyncState` - Checkpoint of a single stream (cursor field -> epoch ms)
//! - `State` - Checkpoints of every stream, in the `{"data": {...}}` shape
//! - `StateManager` - File-based state persistence
//! - `resolve_window` / `CursorTracker` - Window resolution and forward-only filtering

mod cursor;
mod manager;
mod types;

pub use cursor::{resolve_window, CursorTracker, ResolvedWindow, SyncWindow};
pub use manager::StateManager;
pub use types::{State, SyncState};

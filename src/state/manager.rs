//! Checkpoint persistence
//!
//! Holds the checkpoints of every stream for one run and writes them back
//! as a single JSON document. Writes go to a temporary sibling file that is
//! then renamed over the target, so a crash never leaves a truncated file.

use super::types::{State, SyncState};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Shared checkpoint store; clones see the same state
///
/// A store loaded from a file writes every checkpoint update back to it.
#[derive(Debug, Clone)]
pub struct StateManager {
    path: Option<PathBuf>,
    state: Arc<RwLock<State>>,
}

impl StateManager {
    fn with(path: Option<PathBuf>, state: State) -> Self {
        Self {
            path,
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Empty store that is never written anywhere
    pub fn in_memory() -> Self {
        Self::with(None, State::new())
    }

    /// Load from `path` if it exists; a missing or blank file means no checkpoints
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let state = match std::fs::read_to_string(path) {
            Ok(contents) => parse_state(&contents, "state file")?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => State::new(),
            Err(e) => return Err(Error::state(format!("Failed to read state file: {e}"))),
        };
        Ok(Self::with(Some(path.to_path_buf()), state))
    }

    /// In-memory store seeded from inline JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::with(None, parse_state(json, "state JSON")?))
    }

    /// Write the current state to `path`
    pub async fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let contents = serde_json::to_string_pretty(&*self.state.read().await)
            .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))?;
        write_atomic(path.as_ref(), &contents).await?;
        debug!(path = %path.as_ref().display(), "State saved");
        Ok(())
    }

    /// Checkpoint of one stream
    pub async fn get_stream(&self, stream: &str) -> Option<SyncState> {
        self.state.read().await.get_stream(stream).cloned()
    }

    /// Replace the checkpoint of one stream
    pub async fn set_stream(&self, stream: &str, sync_state: SyncState) -> Result<()> {
        self.state.write().await.set_stream(stream, sync_state);
        match &self.path {
            Some(path) => self.save_to_file(path).await,
            None => Ok(()),
        }
    }
}

fn parse_state(contents: &str, what: &str) -> Result<State> {
    if contents.trim().is_empty() {
        return Ok(State::new());
    }
    serde_json::from_str(contents).map_err(|e| Error::state(format!("Failed to parse {what}: {e}")))
}

async fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::state(format!("Failed to create state directory: {e}")))?;
    }

    let temp_path = path.with_extension("tmp");
    tokio::fs::write(&temp_path, contents)
        .await
        .map_err(|e| Error::state(format!("Failed to write state file: {e}")))?;
    tokio::fs::rename(&temp_path, path)
        .await
        .map_err(|e| Error::state(format!("Failed to replace state file: {e}")))
}

//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::{connection_specification, ConnectorConfig, SourceConfig};
use crate::engine::{Catalog, CheckStatus, Message, SpecMessage, SyncEngine};
use crate::error::{Error, Result};
use crate::http::{ApiClient, HttpClient};
use crate::output::{JsonLinesWriter, MessageSink};
use crate::state::{StateManager, SyncWindow};
use crate::streams::{all_descriptors, StreamName};
use chrono::Utc;
use serde_json::{json, Value};
use std::fs;
use std::time::Instant;
use tracing::{info, info_span, warn, Instrument};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command, writing protocol messages to stdout
    pub async fn run(&self) -> Result<()> {
        let mut out = JsonLinesWriter::stdout().pretty(self.cli.format == OutputFormat::Pretty);
        self.run_with(&mut out).await
    }

    /// Run the CLI command against any sink
    pub async fn run_with(&self, sink: &mut dyn MessageSink) -> Result<()> {
        match &self.cli.command {
            Commands::Spec => self.spec(sink),
            Commands::Check { config_json } => self.check(config_json.as_deref(), sink).await,
            Commands::Discover { config_json } => self.discover(config_json.as_deref(), sink),
            Commands::Read {
                streams,
                config_json,
            } => self.read(streams.as_deref(), config_json.as_deref(), sink).await,
        }
    }

    /// Load configuration
    fn load_config(&self, inline: Option<&str>) -> Result<Value> {
        // Inline config takes precedence
        if let Some(json_str) = inline {
            return serde_json::from_str(json_str)
                .map_err(|e| Error::config(format!("Invalid config JSON: {e}")));
        }

        if let Some(path) = &self.cli.config {
            let content = fs::read_to_string(path)
                .map_err(|e| Error::config(format!("Failed to read config file: {e}")))?;
            return serde_json::from_str(&content)
                .map_err(|e| Error::config(format!("Invalid config JSON: {e}")));
        }

        // Validation reports the first missing field
        Ok(json!({}))
    }

    /// Load and validate configuration
    fn source_config(&self, inline: Option<&str>) -> Result<SourceConfig> {
        ConnectorConfig::from_value(self.load_config(inline)?)?.validate()
    }

    /// Load state
    fn load_state(&self) -> Result<StateManager> {
        // Inline state takes precedence
        if let Some(state_json) = &self.cli.state_json {
            StateManager::from_json(state_json)
        } else if let Some(path) = &self.cli.state {
            StateManager::from_file(path)
        } else {
            Ok(StateManager::in_memory())
        }
    }

    /// Show spec
    fn spec(&self, sink: &mut dyn MessageSink) -> Result<()> {
        sink.emit(&Message::Spec {
            spec: SpecMessage {
                connection_specification: connection_specification(),
            },
        })
    }

    /// Check connection
    ///
    /// Failures are reported as a `FAILED` status, not as an error.
    async fn check(&self, config_json: Option<&str>, sink: &mut dyn MessageSink) -> Result<()> {
        let message = match self.try_check(config_json).await {
            Ok(region) => {
                info!(%region, "Connection check succeeded");
                Message::connection_status(
                    CheckStatus::Succeeded,
                    format!("Connection successful (region: {region})"),
                )
            }
            Err(e) => {
                warn!("Connection check failed: {e}");
                Message::connection_status(CheckStatus::Failed, e.to_string())
            }
        };
        sink.emit(&message)
    }

    /// One authenticated usage listing for the current day
    async fn try_check(&self, config_json: Option<&str>) -> Result<String> {
        let config = self.source_config(config_json)?;
        let client = HttpClient::for_source(&config)?;

        let today = Utc::now().date_naive();
        let window = SyncWindow {
            start: today,
            end: today,
            boundary: 0,
        };
        let listing = StreamName::Usage.descriptor().listing;
        let query = listing.window_params(&window, &config.app_id);
        client.get_json(listing.path, &query).await?;

        Ok(config.region.to_string())
    }

    /// Emit the catalog
    ///
    /// The catalog is static; a supplied config is still validated.
    fn discover(&self, config_json: Option<&str>, sink: &mut dyn MessageSink) -> Result<()> {
        if config_json.is_some() || self.cli.config.is_some() {
            self.source_config(config_json)?;
        }

        let streams = all_descriptors()
            .iter()
            .map(crate::streams::StreamDescriptor::catalog_entry)
            .collect();
        sink.emit(&Message::Catalog {
            catalog: Catalog { streams },
        })
    }

    /// Read the selected streams, one after another
    async fn read(
        &self,
        streams: Option<&str>,
        config_json: Option<&str>,
        sink: &mut dyn MessageSink,
    ) -> Result<()> {
        let sync_start = Instant::now();
        let mut config = self.source_config(config_json)?;
        if let Some(filter) = streams {
            config.streams = parse_stream_filter(filter)?;
        }
        let state = self.load_state()?;
        let client = HttpClient::for_source(&config)?;
        let mut engine = SyncEngine::new(client, config.app_id.clone(), config.start_date);

        let span = info_span!("read", region = %config.region);
        let failures = async {
            let mut failures = Vec::new();
            for stream in config.selected_streams() {
                let descriptor = stream.descriptor();
                let incoming = state.get_stream(stream.as_str()).await;

                match engine
                    .sync_stream(&descriptor, incoming.as_ref(), &mut *sink)
                    .await
                {
                    Ok(outgoing) if !outgoing.is_empty() => {
                        state.set_stream(stream.as_str(), outgoing).await?;
                    }
                    Ok(_) => {}
                    Err(e) => failures.push((stream, e)),
                }
            }
            Ok::<_, Error>(failures)
        }
        .instrument(span)
        .await?;

        if let Some(path) = &self.cli.state {
            state.save_to_file(path).await?;
        }

        let stats = engine.stats();
        info!(
            records = stats.records_emitted,
            requests = stats.requests,
            streams_synced = stats.streams_synced,
            failed = failures.len(),
            duration_ms = sync_start.elapsed().as_millis() as u64,
            "Read finished"
        );

        let mut failures = failures.into_iter();
        match failures.next() {
            None => Ok(()),
            Some((stream, first)) => {
                let mut names = vec![stream.as_str()];
                names.extend(failures.map(|(stream, _)| stream.as_str()));
                Err(Error::stream_failed(names.join(", "), first))
            }
        }
    }
}

/// Parse a comma-separated stream list; blank entries are ignored
fn parse_stream_filter(filter: &str) -> Result<Vec<StreamName>> {
    let mut streams = Vec::new();
    for name in filter.split(',').filter(|s| !s.trim().is_empty()) {
        let stream: StreamName = name.parse()?;
        if !streams.contains(&stream) {
            streams.push(stream);
        }
    }
    Ok(streams)
}

//! Execution engine module
//!
//! One pass per stream: resolve the window, walk the listing, evaluate each
//! candidate against the cursor, emit records and finally one checkpoint.
//!
//! # Overview
//!
//! The engine module provides:
//! - `SyncEngine` - Runs passes for any `StreamDescriptor`
//! - `SyncStats` - Counters across passes
//! - Message types for output (Record, State, Log, and command-level messages)

mod types;

pub use types::{
    Catalog, CheckStatus, ConnectionStatus, Message, RecordMessage, SpecMessage, SyncStats,
};

use crate::error::{Error, Result};
use crate::http::{ApiClient, QueryParams};
use crate::output::MessageSink;
use crate::pagination::PaginationState;
use crate::state::{resolve_window, CursorTracker, SyncState};
use crate::streams::{DetailRequest, ProjectionContext, SourceItem, StreamDescriptor};
use crate::types::{JsonValue, LogLevel};
use chrono::{DateTime, NaiveDate, Utc};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Sync engine for orchestrating data extraction
pub struct SyncEngine<C> {
    /// API client
    client: C,
    /// Account whose data is replicated
    app_id: String,
    /// Configured first day, used when there is no checkpoint
    start_date: NaiveDate,
    /// Fixed clock; `None` reads the system clock
    now: Option<DateTime<Utc>>,
    /// Statistics
    stats: SyncStats,
}

impl<C: ApiClient> SyncEngine<C> {
    /// Create a new sync engine
    pub fn new(client: C, app_id: impl Into<String>, start_date: NaiveDate) -> Self {
        Self {
            client,
            app_id: app_id.into(),
            start_date,
            now: None,
            stats: SyncStats::default(),
        }
    }

    /// Pin the clock used for windows, defaults and `emitted_at`
    #[must_use]
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    /// Get statistics
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }

    /// Run one pass of a stream
    ///
    /// Returns the outgoing checkpoint: the incoming one unchanged when
    /// nothing new was kept, otherwise the new maximum position. On failure
    /// an `ERROR` log is emitted, no checkpoint is written, and records
    /// already emitted stay emitted.
    pub async fn sync_stream(
        &mut self,
        descriptor: &StreamDescriptor,
        incoming: Option<&SyncState>,
        sink: &mut dyn MessageSink,
    ) -> Result<SyncState> {
        let start = Instant::now();
        let label = descriptor.label;

        self.log(
            sink,
            descriptor,
            LogLevel::Info,
            format!("Starting sync for {label} stream"),
        )?;

        let result = self.run_pass(descriptor, incoming, sink).await;

        self.stats.duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(state) => {
                self.stats.streams_synced += 1;
                self.log(
                    sink,
                    descriptor,
                    LogLevel::Info,
                    format!("Completed sync for {label} stream"),
                )?;
                Ok(state)
            }
            Err(e) => {
                self.stats.errors += 1;
                let message = format!("Error syncing {label}: {e}");
                if let Err(log_err) = self.log(sink, descriptor, LogLevel::Error, message) {
                    warn!(stream = %descriptor.name, "Could not emit error log: {log_err}");
                }
                Err(e)
            }
        }
    }

    async fn run_pass(
        &mut self,
        descriptor: &StreamDescriptor,
        incoming: Option<&SyncState>,
        sink: &mut dyn MessageSink,
    ) -> Result<SyncState> {
        let now = self.now();
        let resolved = resolve_window(incoming, descriptor.cursor_field, self.start_date, now);
        if let Some(warning) = resolved.warning {
            self.log(sink, descriptor, LogLevel::Warn, warning)?;
        }
        let window = resolved.window;

        self.log(
            sink,
            descriptor,
            LogLevel::Info,
            format!(
                "Fetching {} data from {} to {}",
                descriptor.label,
                window.from_param(),
                window.to_param()
            ),
        )?;

        let app_id = self.app_id.clone();
        let ctx = ProjectionContext {
            app_id: &app_id,
            now,
        };
        let mut tracker = CursorTracker::new(window.boundary);
        let paginator = descriptor.strategy.paginator();
        let mut pagination = PaginationState::new();
        let detail = descriptor.strategy.detail();

        loop {
            let mut query = descriptor.listing.window_params(&window, &app_id);
            query.extend(paginator.page_params(&pagination));

            let body = self.fetch(descriptor.listing.path, &query).await?;
            self.stats.pages_fetched += 1;
            let items = items_at(&body, descriptor.listing.records_key)?;
            let count = items.len();

            debug!(
                stream = %descriptor.name,
                page = pagination.pages_fetched + 1,
                items = count,
                "Fetched listing page"
            );

            if count == 0 && pagination.is_first_page() {
                self.log(
                    sink,
                    descriptor,
                    LogLevel::Info,
                    format!(
                        "No {} found for the specified time period",
                        descriptor.item_noun
                    ),
                )?;
                return Ok(incoming.cloned().unwrap_or_default());
            }

            for item in items {
                match detail {
                    Some(detail) => {
                        self.process_parent(descriptor, detail, &ctx, item, &mut tracker, sink)
                            .await?;
                    }
                    None => {
                        self.process_item(
                            descriptor,
                            &ctx,
                            &SourceItem::listed(item),
                            &mut tracker,
                            sink,
                        )?;
                    }
                }
            }

            if paginator.process_page(count, &mut pagination).is_done() {
                break;
            }
        }

        info!(
            stream = %descriptor.name,
            evaluated = tracker.evaluated(),
            kept = tracker.kept(),
            pages = pagination.pages_fetched,
            "Pass finished"
        );

        if !tracker.advanced() {
            return Ok(incoming.cloned().unwrap_or_default());
        }

        let outgoing = SyncState::at(descriptor.cursor_field, tracker.max());
        sink.emit(&Message::state(descriptor.name.as_str(), outgoing.clone()))?;
        Ok(outgoing)
    }

    /// Fetch the children of one listed parent and evaluate each
    async fn process_parent(
        &mut self,
        descriptor: &StreamDescriptor,
        detail: &DetailRequest,
        ctx: &ProjectionContext<'_>,
        parent: &JsonValue,
        tracker: &mut CursorTracker,
        sink: &mut dyn MessageSink,
    ) -> Result<()> {
        let parent_position = descriptor
            .cursor_unit
            .to_millis((detail.parent_position)(ctx, parent));
        if tracker.is_behind(parent_position) {
            self.stats.parents_skipped += 1;
            return Ok(());
        }

        let Some(parent_id) = crate::streams::fields::key_part(parent, detail.parent_id_field)
        else {
            self.stats.parents_skipped += 1;
            return self.log(
                sink,
                descriptor,
                LogLevel::Warn,
                format!(
                    "Skipping {} item without {}",
                    descriptor.label, detail.parent_id_field
                ),
            );
        };

        let query: QueryParams = vec![
            (detail.id_param.to_string(), parent_id),
            ("app_id".to_string(), ctx.app_id.to_string()),
        ];
        let body = self.fetch(detail.path, &query).await?;
        self.stats.details_fetched += 1;

        for child in items_at(&body, detail.records_key)? {
            let source = SourceItem {
                parent,
                child: Some(child),
            };
            self.process_item(descriptor, ctx, &source, tracker, sink)?;
        }
        Ok(())
    }

    /// Evaluate one candidate and emit its records if kept
    fn process_item(
        &mut self,
        descriptor: &StreamDescriptor,
        ctx: &ProjectionContext<'_>,
        source: &SourceItem<'_>,
        tracker: &mut CursorTracker,
        sink: &mut dyn MessageSink,
    ) -> Result<()> {
        let Some(candidate) = (descriptor.project)(ctx, source) else {
            self.stats.candidates_skipped += 1;
            return self.log(
                sink,
                descriptor,
                LogLevel::Warn,
                format!(
                    "Skipping {} item without a usable {}",
                    descriptor.label, descriptor.cursor_field
                ),
            );
        };

        self.stats.candidates_evaluated += 1;
        let position = descriptor.cursor_unit.to_millis(candidate.position);
        if !tracker.observe(position) {
            self.stats.candidates_skipped += 1;
            return Ok(());
        }

        let emitted_at = ctx.now.timestamp_millis();
        for pending in candidate.records {
            let mut data = pending.fields;
            data.insert(
                descriptor.primary_key.to_string(),
                JsonValue::from(pending.key.into_identity()),
            );
            data.insert(
                descriptor.cursor_field.to_string(),
                JsonValue::from(position),
            );
            sink.emit(&Message::record(descriptor.name.as_str(), data, emitted_at))?;
            self.stats.records_emitted += 1;
        }
        Ok(())
    }

    async fn fetch(&mut self, path: &str, query: &QueryParams) -> Result<JsonValue> {
        self.stats.requests += 1;
        debug!(path, "GET");
        self.client.get_json(path, query).await
    }

    /// Emit a diagnostic and mirror it to tracing
    fn log(
        &self,
        sink: &mut dyn MessageSink,
        descriptor: &StreamDescriptor,
        level: LogLevel,
        message: String,
    ) -> Result<()> {
        let stream = descriptor.name.as_str();
        match level {
            LogLevel::Info => info!(stream, "{message}"),
            LogLevel::Warn => warn!(stream, "{message}"),
            LogLevel::Error => error!(stream, "{message}"),
        }
        sink.emit(&Message::log(level, message))
    }
}

/// Items array under `key`; missing or null means no items
fn items_at<'a>(body: &'a JsonValue, key: &str) -> Result<&'a [JsonValue]> {
    match body.get(key) {
        None | Some(JsonValue::Null) => Ok(&[]),
        Some(JsonValue::Array(items)) => Ok(items),
        Some(other) => Err(Error::decode(format!(
            "Expected '{key}' to be an array, got {}",
            json_kind(other)
        ))),
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests;

//! Tests for engine module

use super::*;
use crate::output::MemorySink;
use crate::streams::StreamName;
use async_trait::async_trait;
use chrono::TimeZone;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Mutex;

// ============================================================================
// Scripted client
// ============================================================================

type Handler = Box<dyn Fn(&str, &QueryParams) -> Result<JsonValue> + Send + Sync>;

/// Answers every call through a closure and records what was asked
struct ScriptedClient {
    calls: Mutex<Vec<(String, QueryParams)>>,
    handler: Handler,
}

impl ScriptedClient {
    fn new(
        handler: impl Fn(&str, &QueryParams) -> Result<JsonValue> + Send + Sync + 'static,
    ) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            handler: Box::new(handler),
        }
    }

    fn calls(&self) -> Vec<(String, QueryParams)> {
        self.calls.lock().unwrap().clone()
    }

    fn paths(&self) -> Vec<String> {
        self.calls().into_iter().map(|(path, _)| path).collect()
    }
}

#[async_trait]
impl ApiClient for ScriptedClient {
    async fn get_json(&self, path: &str, query: &QueryParams) -> Result<JsonValue> {
        self.calls
            .lock()
            .unwrap()
            .push((path.to_string(), query.clone()));
        (self.handler)(path, query)
    }
}

fn param<'a>(query: &'a QueryParams, name: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 15, 30, 0).unwrap()
}

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

fn engine<C: ApiClient>(client: C) -> SyncEngine<C> {
    SyncEngine::new(client, "app-1", start_date()).with_now(now())
}

fn records(sink: &MemorySink) -> Vec<&RecordMessage> {
    sink.messages()
        .iter()
        .filter_map(|m| match m {
            Message::Record { record } => Some(record),
            _ => None,
        })
        .collect()
}

fn logs(sink: &MemorySink) -> Vec<(LogLevel, String)> {
    sink.messages()
        .iter()
        .filter_map(|m| match m {
            Message::Log { level, message } => Some((*level, message.clone())),
            _ => None,
        })
        .collect()
}

fn states(sink: &MemorySink) -> Vec<&crate::state::State> {
    sink.messages()
        .iter()
        .filter_map(|m| match m {
            Message::State { state } => Some(state),
            _ => None,
        })
        .collect()
}

// ============================================================================
// call_quality: listing with per-call detail
// ============================================================================

const CALL1_END: i64 = 1_741_000_100;
const CALL2_END: i64 = 1_741_000_200;

fn calls_listing() -> JsonValue {
    json!({"calls": [
        {"call_id": "call1", "channel_id": "ch", "start_time": 1_741_000_000, "end_time": CALL1_END},
        {"call_id": "call2", "channel_id": "ch", "start_time": 1_741_000_000, "end_time": CALL2_END}
    ]})
}

fn call_detail(call_id: &str) -> JsonValue {
    match call_id {
        "call1" => json!({"user_metrics": [
            {"user_id": "u1", "latest_metric_time": CALL1_END - 10},
            {"user_id": "u2", "latest_metric_time": CALL1_END}
        ]}),
        _ => json!({"user_metrics": [
            {"user_id": "u3", "latest_metric_time": CALL2_END}
        ]}),
    }
}

fn call_quality_client() -> ScriptedClient {
    ScriptedClient::new(|path, query| match path {
        "/v1/call/lists" => Ok(calls_listing()),
        "/v1/call/quality" => Ok(call_detail(param(query, "call_id").unwrap_or_default())),
        other => panic!("unexpected path {other}"),
    })
}

#[tokio::test]
async fn test_call_quality_fresh_pass() {
    let client = call_quality_client();
    let mut engine = engine(&client);
    let mut sink = MemorySink::new();
    let descriptor = StreamName::CallQuality.descriptor();

    let state = engine
        .sync_stream(&descriptor, None, &mut sink)
        .await
        .unwrap();

    let emitted = records(&sink);
    assert_eq!(emitted.len(), 3);
    let positions: Vec<i64> = emitted
        .iter()
        .map(|r| r.data["timestamp"].as_i64().unwrap())
        .collect();
    assert_eq!(
        positions,
        vec![
            (CALL1_END - 10) * 1000,
            CALL1_END * 1000,
            CALL2_END * 1000
        ]
    );
    for record in &emitted {
        assert_eq!(record.stream, "call_quality");
        assert_eq!(record.emitted_at, now().timestamp_millis());
        assert_eq!(record.data["quality_id"].as_str().unwrap().len(), 32);
    }

    assert_eq!(state, SyncState::at("timestamp", CALL2_END * 1000));
    let emitted_states = states(&sink);
    assert_eq!(emitted_states.len(), 1);
    assert_eq!(
        emitted_states[0].get_stream("call_quality"),
        Some(&SyncState::at("timestamp", CALL2_END * 1000))
    );
    assert!(matches!(sink.messages().last(), Some(Message::Log { .. })));

    assert_eq!(
        client.paths(),
        vec!["/v1/call/lists", "/v1/call/quality", "/v1/call/quality"]
    );
    let calls = client.calls();
    let listing = &calls[0].1;
    assert_eq!(param(listing, "from_date"), Some("2025-01-01"));
    assert_eq!(param(listing, "to_date"), Some("2025-03-10"));
    assert_eq!(param(listing, "app_id"), Some("app-1"));
    assert_eq!(param(listing, "order"), Some("desc"));
    assert_eq!(param(&calls[1].1, "call_id"), Some("call1"));
    assert_eq!(param(&calls[2].1, "app_id"), Some("app-1"));

    let stats = engine.stats();
    assert_eq!(stats.requests, 3);
    assert_eq!(stats.details_fetched, 2);
    assert_eq!(stats.records_emitted, 3);
    assert_eq!(stats.streams_synced, 1);
}

#[tokio::test]
async fn test_call_quality_caught_up_pass_is_idempotent() {
    let client = call_quality_client();
    let mut engine = engine(&client);
    let mut sink = MemorySink::new();
    let descriptor = StreamName::CallQuality.descriptor();
    let incoming = SyncState::at("timestamp", CALL2_END * 1000);

    let state = engine
        .sync_stream(&descriptor, Some(&incoming), &mut sink)
        .await
        .unwrap();

    assert_eq!(state, incoming);
    assert_eq!(sink.record_count(), 0);
    assert_eq!(sink.state_count(), 0);
    // Both calls ended at or before the checkpoint; no detail requests
    assert_eq!(client.paths(), vec!["/v1/call/lists"]);
    assert_eq!(engine.stats().parents_skipped, 2);
    assert_eq!(param(&client.calls()[0].1, "from_date"), Some("2025-03-03"));
}

#[tokio::test]
async fn test_call_quality_detail_failure_keeps_emitted_records() {
    let client = ScriptedClient::new(|path, query| match path {
        "/v1/call/lists" => Ok(calls_listing()),
        "/v1/call/quality" => match param(query, "call_id") {
            Some("call1") => Ok(call_detail("call1")),
            _ => Err(Error::http_status(500, "boom")),
        },
        other => panic!("unexpected path {other}"),
    });
    let mut engine = engine(&client);
    let mut sink = MemorySink::new();
    let descriptor = StreamName::CallQuality.descriptor();

    let err = engine
        .sync_stream(&descriptor, None, &mut sink)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 500, .. }));
    assert_eq!(sink.record_count(), 2);
    assert_eq!(sink.state_count(), 0);

    let (level, message) = logs(&sink).pop().unwrap();
    assert_eq!(level, LogLevel::Error);
    assert!(message.starts_with("Error syncing call quality:"));
    assert_eq!(engine.stats().errors, 1);
    assert_eq!(engine.stats().streams_synced, 0);
}

#[tokio::test]
async fn test_call_quality_children_filtered_by_running_max() {
    const BASE: i64 = 1_741_000_000;
    let client = ScriptedClient::new(|path, query| match path {
        "/v1/call/lists" => Ok(json!({"calls": [
            {"call_id": "a", "end_time": BASE + 100},
            {"call_id": "b", "end_time": BASE + 80},
            {"call_id": "c", "end_time": BASE + 300}
        ]})),
        "/v1/call/quality" => match param(query, "call_id") {
            Some("a") => Ok(json!({"user_metrics": [
                {"user_id": "a1", "latest_metric_time": BASE + 50},
                {"user_id": "a2", "latest_metric_time": BASE + 30},
                {"user_id": "a3", "latest_metric_time": BASE + 100},
                {"user_id": "a4", "latest_metric_time": BASE + 100}
            ]})),
            Some("c") => Ok(json!({"user_metrics": [
                {"user_id": "c1", "latest_metric_time": BASE + 200},
                {"user_id": "c2", "latest_metric_time": BASE + 150},
                {"user_id": "c3", "latest_metric_time": BASE + 300}
            ]})),
            other => panic!("unexpected detail request for {other:?}"),
        },
        other => panic!("unexpected path {other}"),
    });
    let mut engine = engine(&client);
    let mut sink = MemorySink::new();

    let state = engine
        .sync_stream(&StreamName::CallQuality.descriptor(), None, &mut sink)
        .await
        .unwrap();

    let users: Vec<&str> = records(&sink)
        .iter()
        .map(|r| r.data["user_id"].as_str().unwrap())
        .collect();
    assert_eq!(users, vec!["a1", "a3", "c1", "c3"]);

    // Call b ended before the running max reached by call a
    assert_eq!(
        client.paths(),
        vec!["/v1/call/lists", "/v1/call/quality", "/v1/call/quality"]
    );
    assert_eq!(param(&client.calls()[2].1, "call_id"), Some("c"));

    let emitted_states = states(&sink);
    assert_eq!(emitted_states.len(), 1);
    assert_eq!(
        emitted_states[0].get_stream("call_quality"),
        Some(&SyncState::at("timestamp", (BASE + 300) * 1000))
    );
    assert_eq!(state, SyncState::at("timestamp", (BASE + 300) * 1000));

    let stats = engine.stats();
    assert_eq!(stats.parents_skipped, 1);
    assert_eq!(stats.candidates_evaluated, 7);
    assert_eq!(stats.candidates_skipped, 3);
    assert_eq!(stats.records_emitted, 4);
}

#[tokio::test]
async fn test_call_without_id_is_skipped() {
    let client = ScriptedClient::new(|path, _| match path {
        "/v1/call/lists" => Ok(json!({"calls": [{"end_time": CALL1_END}]})),
        other => panic!("unexpected path {other}"),
    });
    let mut engine = engine(&client);
    let mut sink = MemorySink::new();

    engine
        .sync_stream(&StreamName::CallQuality.descriptor(), None, &mut sink)
        .await
        .unwrap();

    assert_eq!(client.paths(), vec!["/v1/call/lists"]);
    assert!(logs(&sink)
        .iter()
        .any(|(level, msg)| *level == LogLevel::Warn && msg.contains("call_id")));
}

// ============================================================================
// events: page-numbered listing
// ============================================================================

fn event_page(page: u32, len: usize) -> JsonValue {
    let events: Vec<JsonValue> = (0..len)
        .map(|i| {
            json!({
                "event_id": format!("p{page}-{i}"),
                "event_type": "join",
                "timestamp": 1_741_000_000 + i64::from(page) * 1000 + i as i64
            })
        })
        .collect();
    json!({ "events": events })
}

#[tokio::test]
async fn test_events_walks_pages_until_short_page() {
    let client = ScriptedClient::new(|path, query| {
        assert_eq!(path, "/v1/events");
        let page: u32 = param(query, "page").unwrap().parse().unwrap();
        let len = if page < 4 { 100 } else { 7 };
        Ok(event_page(page, len))
    });
    let mut engine = engine(&client);
    let mut sink = MemorySink::new();

    let state = engine
        .sync_stream(&StreamName::Events.descriptor(), None, &mut sink)
        .await
        .unwrap();

    let pages: Vec<String> = client
        .calls()
        .iter()
        .map(|(_, q)| param(q, "page").unwrap().to_string())
        .collect();
    assert_eq!(pages, vec!["1", "2", "3", "4"]);
    assert!(client
        .calls()
        .iter()
        .all(|(_, q)| param(q, "limit") == Some("100")));

    assert_eq!(sink.record_count(), 307);
    assert_eq!(engine.stats().pages_fetched, 4);
    assert_eq!(
        state,
        SyncState::at("timestamp", (1_741_000_000 + 4000 + 6) * 1000)
    );
}

#[tokio::test]
async fn test_empty_first_page_stops_with_info() {
    let client = ScriptedClient::new(|_, _| Ok(json!({"events": []})));
    let mut engine = engine(&client);
    let mut sink = MemorySink::new();
    let incoming = SyncState::at("timestamp", 1_741_000_000_000);

    let state = engine
        .sync_stream(&StreamName::Events.descriptor(), Some(&incoming), &mut sink)
        .await
        .unwrap();

    assert_eq!(client.calls().len(), 1);
    assert_eq!(state, incoming);
    assert_eq!(sink.state_count(), 0);
    assert!(logs(&sink).contains(&(
        LogLevel::Info,
        "No events found for the specified time period".to_string()
    )));
}

#[tokio::test]
async fn test_missing_items_key_counts_as_empty() {
    let client = ScriptedClient::new(|_, _| Ok(json!({"total": 0})));
    let mut engine = engine(&client);
    let mut sink = MemorySink::new();

    let state = engine
        .sync_stream(&StreamName::Channels.descriptor(), None, &mut sink)
        .await
        .unwrap();

    assert!(state.is_empty());
    assert_eq!(sink.record_count(), 0);
}

#[tokio::test]
async fn test_non_array_items_is_decode_error() {
    let client = ScriptedClient::new(|_, _| Ok(json!({"events": {"oops": true}})));
    let mut engine = engine(&client);
    let mut sink = MemorySink::new();

    let err = engine
        .sync_stream(&StreamName::Events.descriptor(), None, &mut sink)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Decode { .. }));
    assert_eq!(sink.state_count(), 0);
}

#[tokio::test]
async fn test_events_behind_checkpoint_are_discarded() {
    let client = ScriptedClient::new(|_, _| {
        Ok(json!({"events": [
            {"event_id": "new", "timestamp": 1_741_000_010},
            {"event_id": "same", "timestamp": 1_741_000_000},
            {"event_id": "old", "timestamp": 1_740_999_000}
        ]}))
    });
    let mut engine = engine(&client);
    let mut sink = MemorySink::new();
    let incoming = SyncState::at("timestamp", 1_741_000_000_000);

    let state = engine
        .sync_stream(&StreamName::Events.descriptor(), Some(&incoming), &mut sink)
        .await
        .unwrap();

    let emitted = records(&sink);
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].data["event_id"], json!("new"));
    assert_eq!(state, SyncState::at("timestamp", 1_741_000_010_000));

    let stats = engine.stats();
    assert_eq!(stats.candidates_evaluated, 3);
    assert_eq!(stats.candidates_skipped, 2);
}

#[tokio::test]
async fn test_malformed_checkpoint_warns_and_uses_start_date() {
    let client = ScriptedClient::new(|_, _| {
        Ok(json!({"events": [{"event_id": "e", "timestamp": 1_741_000_000}]}))
    });
    let mut engine = engine(&client);
    let mut sink = MemorySink::new();
    let incoming: SyncState = serde_json::from_value(json!({"timestamp": "yesterday"})).unwrap();

    let state = engine
        .sync_stream(&StreamName::Events.descriptor(), Some(&incoming), &mut sink)
        .await
        .unwrap();

    assert_eq!(
        param(&client.calls()[0].1, "from_date"),
        Some("2025-01-01")
    );
    assert!(logs(&sink)
        .iter()
        .any(|(level, msg)| *level == LogLevel::Warn && msg.ends_with("syncing from 2025-01-01")));
    assert_eq!(state, SyncState::at("timestamp", 1_741_000_000_000));
}

// ============================================================================
// usage: one item fans out into many records
// ============================================================================

#[tokio::test]
async fn test_usage_fan_out_end_to_end() {
    let client = ScriptedClient::new(|path, query| {
        assert_eq!(path, "/v1/usage");
        assert_eq!(param(query, "start_date"), Some("2025-01-01"));
        assert_eq!(param(query, "end_date"), Some("2025-03-10"));
        assert_eq!(param(query, "order"), None);
        Ok(json!({"usage": [
            {"date": "2025-01-01", "audio_minutes": 5},
            {
                "date": "2025-01-02",
                "audio_minutes": 30,
                "bandwidth_usage": 1.5,
                "by_region": {"eu": {"audio_minutes": 10}}
            },
            {"audio_minutes": 99}
        ]}))
    });
    let mut engine = engine(&client);
    let mut sink = MemorySink::new();

    let state = engine
        .sync_stream(&StreamName::Usage.descriptor(), None, &mut sink)
        .await
        .unwrap();

    let emitted = records(&sink);
    let summary: Vec<(String, String, i64)> = emitted
        .iter()
        .map(|r| {
            (
                r.data["region"].as_str().unwrap().to_string(),
                r.data["resource_type"].as_str().unwrap().to_string(),
                r.data["timestamp"].as_i64().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            ("global".into(), "audio_minutes".into(), 1_735_689_600_000),
            ("eu".into(), "audio_minutes".into(), 1_735_776_000_000),
            ("global".into(), "audio_minutes".into(), 1_735_776_000_000),
            ("global".into(), "bandwidth_usage".into(), 1_735_776_000_000),
        ]
    );
    assert_eq!(state, SyncState::at("timestamp", 1_735_776_000_000));

    let stats = engine.stats();
    assert_eq!(stats.requests, 1);
    assert_eq!(stats.candidates_evaluated, 2);
    assert_eq!(stats.candidates_skipped, 1);
    assert!(logs(&sink)
        .iter()
        .any(|(level, msg)| *level == LogLevel::Warn && msg.starts_with("Skipping usage item")));
}

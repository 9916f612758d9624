//! `recordings` stream: cloud recording sessions
//!
//! A single newest-first listing; each recording is positioned at its start.

use super::fields::{self, kind};
use super::{
    Candidate, ListingRequest, PendingRecord, ProjectionContext, RecordKey, SourceItem, Strategy,
    StreamDescriptor, StreamName, CURSOR_FIELD, PAGE_SIZE,
};
use crate::types::{CursorUnit, JsonValue};

pub(super) fn descriptor() -> StreamDescriptor {
    StreamDescriptor {
        name: StreamName::Recordings,
        label: "recordings",
        item_noun: "recordings",
        primary_key: "recording_id",
        cursor_field: CURSOR_FIELD,
        cursor_unit: CursorUnit::Seconds,
        listing: ListingRequest {
            path: "/v1/recordings/list",
            records_key: "recordings",
            from_param: "from_date",
            to_param: "to_date",
            extra_params: &[("order", "desc")],
        },
        strategy: Strategy::ListingWithDetail {
            page_size: Some(PAGE_SIZE),
            detail: None,
        },
        project,
        schema: SCHEMA,
    }
}

fn project(ctx: &ProjectionContext<'_>, source: &SourceItem<'_>) -> Option<Candidate> {
    let recording = source.item();

    let resource_id = fields::key_part(recording, "resource_id").unwrap_or_default();
    let channel_id = fields::key_part(recording, "channel_id").unwrap_or_default();
    let start = fields::int(recording, "start_time").unwrap_or_else(|| ctx.now_seconds());
    let end = fields::int(recording, "end_time").unwrap_or_else(|| ctx.now_seconds());

    let key = RecordKey::Composite(vec![
        resource_id.clone(),
        channel_id.clone(),
        start.to_string(),
    ]);

    let record = fields::record([
        ("app_id", JsonValue::from(ctx.app_id)),
        ("channel_id", JsonValue::from(channel_id)),
        ("uid", fields::text_or(recording, "uid", "")),
        ("start_time", JsonValue::from(CursorUnit::Seconds.to_millis(start))),
        ("end_time", JsonValue::from(CursorUnit::Seconds.to_millis(end))),
        ("duration", JsonValue::from(end - start)),
        ("recording_type", fields::text_or(recording, "recording_type", "cloud")),
        ("status", fields::text_or(recording, "status", "completed")),
        ("file_format", fields::text_or(recording, "file_format", "mp4")),
        ("file_size", fields::number(recording, "file_size")),
        ("resolution", fields::text_or(recording, "resolution", "")),
        ("storage_path", fields::text_or(recording, "storage_path", "")),
        ("resource_id", JsonValue::from(resource_id)),
        ("region", fields::text_or(recording, "region", "global")),
        ("error_code", fields::nullable(recording, "error_code")),
        ("error_message", fields::nullable(recording, "error_message")),
        ("parameters", fields::object(recording, "parameters")),
        ("mode", fields::text_or(recording, "mode", "mix")),
        ("recorded_users", fields::array(recording, "recorded_users")),
        ("storage_config", fields::object(recording, "storage_config")),
    ]);

    Some(Candidate {
        position: start,
        records: vec![PendingRecord {
            key,
            fields: record,
        }],
    })
}

const SCHEMA: &[(&str, &[&str])] = &[
    ("recording_id", kind::STRING),
    ("timestamp", kind::INTEGER),
    ("app_id", kind::STRING),
    ("channel_id", kind::STRING),
    ("uid", &["string", "integer"]),
    ("start_time", kind::INTEGER),
    ("end_time", kind::INTEGER),
    ("duration", kind::INTEGER),
    ("recording_type", kind::STRING),
    ("status", kind::STRING),
    ("file_format", kind::STRING),
    ("file_size", kind::INTEGER),
    ("resolution", kind::STRING),
    ("storage_path", kind::STRING),
    ("resource_id", kind::STRING),
    ("region", kind::STRING),
    ("error_code", &["string", "integer", "null"]),
    ("error_message", kind::NULLABLE_STRING),
    ("parameters", kind::OBJECT),
    ("mode", kind::STRING),
    ("recorded_users", kind::ARRAY),
    ("storage_config", kind::OBJECT),
];

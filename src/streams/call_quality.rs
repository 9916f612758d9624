//! `call_quality` stream: per-user quality metrics of each call
//!
//! Lists calls once, then fetches `/v1/call/quality` for every call that
//! ended after the running cursor maximum. Each user metric becomes one record positioned
//! at its latest metric time (or the call end).

use super::fields::{self, kind};
use super::{
    Candidate, DetailRequest, ListingRequest, PendingRecord, ProjectionContext, RecordKey,
    SourceItem, Strategy, StreamDescriptor, StreamName, CURSOR_FIELD, PAGE_SIZE,
};
use crate::types::{CursorUnit, JsonValue};

pub(super) fn descriptor() -> StreamDescriptor {
    StreamDescriptor {
        name: StreamName::CallQuality,
        label: "call quality",
        item_noun: "calls",
        primary_key: "quality_id",
        cursor_field: CURSOR_FIELD,
        cursor_unit: CursorUnit::Seconds,
        listing: ListingRequest {
            path: "/v1/call/lists",
            records_key: "calls",
            from_param: "from_date",
            to_param: "to_date",
            extra_params: &[("order", "desc")],
        },
        strategy: Strategy::ListingWithDetail {
            page_size: Some(PAGE_SIZE),
            detail: Some(DetailRequest {
                path: "/v1/call/quality",
                parent_id_field: "call_id",
                id_param: "call_id",
                records_key: "user_metrics",
                parent_position: call_end,
            }),
        },
        project,
        schema: SCHEMA,
    }
}

/// Call end in seconds; open calls end now
fn call_end(ctx: &ProjectionContext<'_>, call: &JsonValue) -> i64 {
    fields::int(call, "end_time").unwrap_or_else(|| ctx.now_seconds())
}

fn project(ctx: &ProjectionContext<'_>, source: &SourceItem<'_>) -> Option<Candidate> {
    let call = source.parent;
    let user = source.child?;

    let call_id = fields::key_part(call, "call_id").unwrap_or_default();
    let user_id = fields::value_or(user, "user_id", JsonValue::Null);
    let start = fields::int(call, "start_time").unwrap_or(0);
    let end = call_end(ctx, call);
    let position = fields::int(user, "latest_metric_time").unwrap_or(end);

    let key = RecordKey::Composite(vec![
        call_id.clone(),
        fields::key_part(user, "user_id").unwrap_or_default(),
        CursorUnit::Seconds.to_millis(position).to_string(),
    ]);

    let record = fields::record([
        ("channel_id", fields::nullable(call, "channel_id")),
        ("call_id", JsonValue::from(call_id)),
        ("user_id", user_id),
        ("app_id", JsonValue::from(ctx.app_id)),
        ("start_time", JsonValue::from(CursorUnit::Seconds.to_millis(start))),
        ("end_time", JsonValue::from(CursorUnit::Seconds.to_millis(end))),
        ("duration", JsonValue::from(end - start)),
        ("network_type", fields::text_or(user, "network_type", "")),
        ("device_type", fields::text_or(user, "device_type", "")),
        ("sdk_version", fields::text_or(user, "sdk_version", "")),
        ("os_version", fields::text_or(user, "os_version", "")),
        ("region", fields::text_or(user, "region", "")),
        ("audio_quality_score", fields::number(user, "audio_quality")),
        ("video_quality_score", fields::number(user, "video_quality")),
        ("overall_quality_score", fields::number(user, "overall_quality")),
        ("latency", fields::number(user, "latency")),
        ("packet_loss_rate", fields::number(user, "packet_loss_rate")),
        ("jitter", fields::number(user, "jitter")),
        ("audio_bitrate", fields::number(user, "audio_bitrate")),
        ("video_bitrate", fields::number(user, "video_bitrate")),
        ("audio_packet_loss_rate", fields::number(user, "audio_packet_loss_rate")),
        ("video_packet_loss_rate", fields::number(user, "video_packet_loss_rate")),
        ("audio_freeze_count", fields::number(user, "audio_freeze_count")),
        ("video_freeze_count", fields::number(user, "video_freeze_count")),
        ("cpu_usage", fields::number(user, "cpu_usage")),
        ("memory_usage", fields::number(user, "memory_usage")),
        ("video_resolution", fields::text_or(user, "video_resolution", "")),
        ("frame_rate", fields::number(user, "frame_rate")),
        ("issue_description", fields::text_or(user, "issue_description", "")),
        ("has_issues", JsonValue::from(fields::flag(user, "has_issues"))),
    ]);

    Some(Candidate {
        position,
        records: vec![PendingRecord {
            key,
            fields: record,
        }],
    })
}

const SCHEMA: &[(&str, &[&str])] = &[
    ("quality_id", kind::STRING),
    ("timestamp", kind::INTEGER),
    ("channel_id", kind::NULLABLE_STRING),
    ("call_id", kind::STRING),
    ("user_id", &["string", "integer", "null"]),
    ("app_id", kind::STRING),
    ("start_time", kind::INTEGER),
    ("end_time", kind::INTEGER),
    ("duration", kind::INTEGER),
    ("network_type", kind::STRING),
    ("device_type", kind::STRING),
    ("sdk_version", kind::STRING),
    ("os_version", kind::STRING),
    ("region", kind::STRING),
    ("audio_quality_score", kind::NUMBER),
    ("video_quality_score", kind::NUMBER),
    ("overall_quality_score", kind::NUMBER),
    ("latency", kind::NUMBER),
    ("packet_loss_rate", kind::NUMBER),
    ("jitter", kind::NUMBER),
    ("audio_bitrate", kind::NUMBER),
    ("video_bitrate", kind::NUMBER),
    ("audio_packet_loss_rate", kind::NUMBER),
    ("video_packet_loss_rate", kind::NUMBER),
    ("audio_freeze_count", kind::INTEGER),
    ("video_freeze_count", kind::INTEGER),
    ("cpu_usage", kind::NUMBER),
    ("memory_usage", kind::NUMBER),
    ("video_resolution", kind::STRING),
    ("frame_rate", kind::NUMBER),
    ("issue_description", kind::STRING),
    ("has_issues", kind::BOOLEAN),
];

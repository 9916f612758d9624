//! `channels` stream: channel lifecycle and aggregate usage
//!
//! Page-numbered listing. Channels are positioned at their creation time.

use super::fields::{self, kind};
use super::{
    Candidate, ListingRequest, PendingRecord, ProjectionContext, RecordKey, SourceItem, Strategy,
    StreamDescriptor, StreamName, CURSOR_FIELD, PAGE_SIZE,
};
use crate::types::{CursorUnit, JsonValue};

pub(super) fn descriptor() -> StreamDescriptor {
    StreamDescriptor {
        name: StreamName::Channels,
        label: "channels",
        item_noun: "channels",
        primary_key: "channel_id",
        cursor_field: CURSOR_FIELD,
        cursor_unit: CursorUnit::Seconds,
        listing: ListingRequest {
            path: "/v1/channel/list",
            records_key: "channels",
            from_param: "from_date",
            to_param: "to_date",
            extra_params: &[("order", "desc")],
        },
        strategy: Strategy::PagedListing {
            page_size: PAGE_SIZE,
        },
        project,
        schema: SCHEMA,
    }
}

fn project(ctx: &ProjectionContext<'_>, source: &SourceItem<'_>) -> Option<Candidate> {
    let channel = source.item();
    let now = ctx.now_seconds();

    let channel_name = fields::key_part(channel, "channel_name").unwrap_or_default();
    let created = fields::int(channel, "create_time").unwrap_or(now);
    let ended = fields::int(channel, "end_time");

    let key = match fields::key_part(channel, "channel_id") {
        Some(id) => RecordKey::Provided(id),
        None => RecordKey::Composite(vec![
            channel_name.clone(),
            created.to_string(),
            ctx.app_id.to_string(),
        ]),
    };

    let record = fields::record([
        ("app_id", JsonValue::from(ctx.app_id)),
        ("channel_name", JsonValue::from(channel_name)),
        ("create_time", JsonValue::from(CursorUnit::Seconds.to_millis(created))),
        (
            "end_time",
            ended.map_or(JsonValue::Null, |e| {
                JsonValue::from(CursorUnit::Seconds.to_millis(e))
            }),
        ),
        ("duration", JsonValue::from(ended.unwrap_or(now) - created)),
        ("active_status", JsonValue::from(ended.map_or(true, |e| e > now))),
        ("peak_users", fields::number(channel, "peak_users")),
        ("total_users", fields::number(channel, "total_users")),
        ("audio_minutes", fields::number(channel, "audio_minutes")),
        ("video_minutes", fields::number(channel, "video_minutes")),
        ("recording_minutes", fields::number(channel, "recording_minutes")),
        ("region", fields::text_or(channel, "region", "global")),
        ("mode", fields::text_or(channel, "mode", "communication")),
        (
            "encryption_enabled",
            JsonValue::from(fields::flag(channel, "encryption_enabled")),
        ),
        (
            "has_recordings",
            JsonValue::from(fields::flag(channel, "has_recordings")),
        ),
        ("quality_score", fields::number(channel, "quality_score")),
        ("user_join_count", fields::number(channel, "user_join_count")),
        ("user_leave_count", fields::number(channel, "user_leave_count")),
        ("error_count", fields::number(channel, "error_count")),
        ("channel_type", fields::text_or(channel, "channel_type", "video")),
        ("tags", fields::array(channel, "tags")),
        ("metadata", fields::object(channel, "metadata")),
    ]);

    Some(Candidate {
        position: created,
        records: vec![PendingRecord {
            key,
            fields: record,
        }],
    })
}

const SCHEMA: &[(&str, &[&str])] = &[
    ("channel_id", kind::STRING),
    ("timestamp", kind::INTEGER),
    ("app_id", kind::STRING),
    ("channel_name", kind::STRING),
    ("create_time", kind::INTEGER),
    ("end_time", kind::NULLABLE_INTEGER),
    ("duration", kind::INTEGER),
    ("active_status", kind::BOOLEAN),
    ("peak_users", kind::INTEGER),
    ("total_users", kind::INTEGER),
    ("audio_minutes", kind::NUMBER),
    ("video_minutes", kind::NUMBER),
    ("recording_minutes", kind::NUMBER),
    ("region", kind::STRING),
    ("mode", kind::STRING),
    ("encryption_enabled", kind::BOOLEAN),
    ("has_recordings", kind::BOOLEAN),
    ("quality_score", kind::NUMBER),
    ("user_join_count", kind::INTEGER),
    ("user_leave_count", kind::INTEGER),
    ("error_count", kind::INTEGER),
    ("channel_type", kind::STRING),
    ("tags", kind::ARRAY),
    ("metadata", kind::OBJECT),
];

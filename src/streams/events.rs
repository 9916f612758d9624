//! `events` stream: platform events and errors
//!
//! Page-numbered listing. Events are positioned at their own timestamp.

use super::fields::{self, kind};
use super::{
    Candidate, ListingRequest, PendingRecord, ProjectionContext, RecordKey, SourceItem, Strategy,
    StreamDescriptor, StreamName, CURSOR_FIELD, PAGE_SIZE,
};
use crate::types::{CursorUnit, JsonValue};

pub(super) fn descriptor() -> StreamDescriptor {
    StreamDescriptor {
        name: StreamName::Events,
        label: "events",
        item_noun: "events",
        primary_key: "event_id",
        cursor_field: CURSOR_FIELD,
        cursor_unit: CursorUnit::Seconds,
        listing: ListingRequest {
            path: "/v1/events",
            records_key: "events",
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
    let event = source.item();

    let event_type = fields::key_part(event, "event_type").unwrap_or_else(|| "info".to_string());
    // The upstream field is named `timestamp` too, in seconds
    let event_time = fields::int(event, "timestamp").unwrap_or_else(|| ctx.now_seconds());

    let key = match fields::key_part(event, "event_id") {
        Some(id) => RecordKey::Provided(id),
        None => RecordKey::Composite(vec![
            event_type.clone(),
            fields::key_part(event, "channel_id").unwrap_or_else(|| "none".to_string()),
            fields::key_part(event, "user_id").unwrap_or_else(|| "none".to_string()),
            event_time.to_string(),
        ]),
    };

    let record = fields::record([
        ("app_id", JsonValue::from(ctx.app_id)),
        ("channel_id", fields::nullable(event, "channel_id")),
        ("user_id", fields::nullable(event, "user_id")),
        ("event_type", JsonValue::from(event_type)),
        ("event_name", fields::text_or(event, "event_name", "")),
        ("event_description", fields::text_or(event, "event_description", "")),
        ("severity", fields::text_or(event, "severity", "info")),
        ("device_type", fields::nullable(event, "device_type")),
        ("os_version", fields::nullable(event, "os_version")),
        ("sdk_version", fields::nullable(event, "sdk_version")),
        ("network_type", fields::nullable(event, "network_type")),
        ("client_ip", fields::nullable(event, "client_ip")),
        ("region", fields::nullable(event, "region")),
        ("error_code", fields::nullable(event, "error_code")),
        ("error_message", fields::nullable(event, "error_message")),
        ("duration", fields::nullable(event, "duration")),
        ("properties", fields::object(event, "properties")),
        ("related_events", fields::array(event, "related_events")),
        ("resolution", fields::nullable(event, "resolution")),
    ]);

    Some(Candidate {
        position: event_time,
        records: vec![PendingRecord {
            key,
            fields: record,
        }],
    })
}

const SCHEMA: &[(&str, &[&str])] = &[
    ("event_id", kind::STRING),
    ("timestamp", kind::INTEGER),
    ("app_id", kind::STRING),
    ("channel_id", kind::NULLABLE_STRING),
    ("user_id", &["string", "integer", "null"]),
    ("event_type", kind::STRING),
    ("event_name", kind::STRING),
    ("event_description", kind::STRING),
    ("severity", kind::STRING),
    ("device_type", kind::NULLABLE_STRING),
    ("os_version", kind::NULLABLE_STRING),
    ("sdk_version", kind::NULLABLE_STRING),
    ("network_type", kind::NULLABLE_STRING),
    ("client_ip", kind::NULLABLE_STRING),
    ("region", kind::NULLABLE_STRING),
    ("error_code", &["string", "integer", "null"]),
    ("error_message", kind::NULLABLE_STRING),
    ("duration", kind::NULLABLE_NUMBER),
    ("properties", kind::OBJECT),
    ("related_events", kind::ARRAY),
    ("resolution", &["string", "object", "null"]),
];

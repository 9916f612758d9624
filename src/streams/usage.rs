//! `usage` stream: daily resource consumption
//!
//! One listing call returns one item per day. Each day fans out into one
//! record per region and resource type with a positive quantity, followed by
//! the account-wide (`global`) records. Days are positioned at UTC midnight.

use super::fields::{self, kind};
use super::{
    Candidate, ListingRequest, PendingRecord, ProjectionContext, RecordKey, SourceItem, Strategy,
    StreamDescriptor, StreamName, CURSOR_FIELD,
};
use crate::types::{CursorUnit, JsonObject, JsonValue};
use chrono::NaiveDate;

/// Resource types reported per day, with their units
const RESOURCES: [(&str, &str); 7] = [
    ("audio_minutes", "minutes"),
    ("video_sd_minutes", "minutes"),
    ("video_hd_minutes", "minutes"),
    ("video_hd_plus_minutes", "minutes"),
    ("recording_minutes", "minutes"),
    ("bandwidth_usage", "GB"),
    ("cloud_recording_storage", "GB"),
];

const GLOBAL_REGION: &str = "global";

pub(super) fn descriptor() -> StreamDescriptor {
    StreamDescriptor {
        name: StreamName::Usage,
        label: "usage",
        item_noun: "usage",
        primary_key: "usage_id",
        cursor_field: CURSOR_FIELD,
        cursor_unit: CursorUnit::Milliseconds,
        listing: ListingRequest {
            path: "/v1/usage",
            records_key: "usage",
            from_param: "start_date",
            to_param: "end_date",
            extra_params: &[],
        },
        strategy: Strategy::ListingWithDetail {
            page_size: None,
            detail: None,
        },
        project,
        schema: SCHEMA,
    }
}

fn project(ctx: &ProjectionContext<'_>, source: &SourceItem<'_>) -> Option<Candidate> {
    let day = source.item();
    let date = day.get("date")?.as_str()?;
    let position = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()?
        .and_hms_opt(0, 0, 0)?
        .and_utc()
        .timestamp_millis();

    let project_name = fields::text_or(day, "project_name", "");
    let mut records = Vec::new();

    if let Some(JsonValue::Object(by_region)) = day.get("by_region") {
        for (region, totals) in by_region {
            records.extend(region_records(ctx, date, &project_name, region, totals));
        }
    }
    records.extend(region_records(ctx, date, &project_name, GLOBAL_REGION, day));

    Some(Candidate { position, records })
}

/// Records of one region's totals, one per resource type with a positive quantity
fn region_records(
    ctx: &ProjectionContext<'_>,
    date: &str,
    project_name: &JsonValue,
    region: &str,
    totals: &JsonValue,
) -> Vec<PendingRecord> {
    RESOURCES
        .iter()
        .filter_map(|(resource, unit)| {
            fields::positive(totals, resource)?;
            let key = RecordKey::Composite(vec![
                ctx.app_id.to_string(),
                date.to_string(),
                (*resource).to_string(),
                region.to_string(),
            ]);

            let mut record: JsonObject = fields::record([
                ("date", JsonValue::from(date)),
                ("app_id", JsonValue::from(ctx.app_id)),
                ("project_name", project_name.clone()),
                ("resource_type", JsonValue::from(*resource)),
                ("unit", JsonValue::from(*unit)),
                ("quantity", fields::number(totals, resource)),
                ("channel_count", fields::number(totals, "channel_count")),
                ("peak_concurrent_users", fields::number(totals, "peak_concurrent_users")),
                ("region", JsonValue::from(region)),
            ]);
            for (field, _) in RESOURCES {
                record.insert(field.to_string(), fields::number(totals, field));
            }

            Some(PendingRecord {
                key,
                fields: record,
            })
        })
        .collect()
}

const SCHEMA: &[(&str, &[&str])] = &[
    ("usage_id", kind::STRING),
    ("timestamp", kind::INTEGER),
    ("date", kind::STRING),
    ("app_id", kind::STRING),
    ("project_name", kind::STRING),
    ("resource_type", kind::STRING),
    ("unit", kind::STRING),
    ("quantity", kind::NUMBER),
    ("audio_minutes", kind::NUMBER),
    ("video_sd_minutes", kind::NUMBER),
    ("video_hd_minutes", kind::NUMBER),
    ("video_hd_plus_minutes", kind::NUMBER),
    ("recording_minutes", kind::NUMBER),
    ("bandwidth_usage", kind::NUMBER),
    ("cloud_recording_storage", kind::NUMBER),
    ("channel_count", kind::INTEGER),
    ("peak_concurrent_users", kind::INTEGER),
    ("region", kind::STRING),
];

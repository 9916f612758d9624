//! Stream descriptors
//!
//! Every Agora stream is a `StreamDescriptor` value: where to list, how to
//! page, how to turn a raw item into records, and which field is the key.
//! The engine is generic over descriptors; nothing here talks to the network.

mod call_quality;
mod channels;
mod events;
pub(crate) mod fields;
mod recordings;
mod usage;

use crate::error::{Error, Result};
use crate::identity::record_identity;
use crate::pagination::{PageNumberPaginator, Paginator, SingleRequestPaginator};
use crate::state::SyncWindow;
use crate::types::{CursorUnit, JsonObject, JsonValue, SyncMode};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::json;
use std::fmt;
use std::str::FromStr;

/// Cursor field shared by every stream
pub const CURSOR_FIELD: &str = "timestamp";

/// Fixed listing page size
pub const PAGE_SIZE: u32 = 100;

// ============================================================================
// Stream Names
// ============================================================================

/// Streams exposed by the connector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StreamName {
    Usage,
    CallQuality,
    Recordings,
    Channels,
    Events,
}

impl StreamName {
    /// All streams, in the order they are synced
    pub const ALL: [StreamName; 5] = [
        StreamName::Usage,
        StreamName::CallQuality,
        StreamName::Recordings,
        StreamName::Channels,
        StreamName::Events,
    ];

    /// Wire name of the stream
    pub fn as_str(self) -> &'static str {
        match self {
            StreamName::Usage => "usage",
            StreamName::CallQuality => "call_quality",
            StreamName::Recordings => "recordings",
            StreamName::Channels => "channels",
            StreamName::Events => "events",
        }
    }

    /// Descriptor driving this stream's sync
    pub fn descriptor(self) -> StreamDescriptor {
        match self {
            StreamName::Usage => usage::descriptor(),
            StreamName::CallQuality => call_quality::descriptor(),
            StreamName::Recordings => recordings::descriptor(),
            StreamName::Channels => channels::descriptor(),
            StreamName::Events => events::descriptor(),
        }
    }
}

impl fmt::Display for StreamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        StreamName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| Error::StreamNotFound {
                stream: s.to_string(),
            })
    }
}

impl Serialize for StreamName {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// ============================================================================
// Descriptor
// ============================================================================

/// Clock and account context handed to projections
#[derive(Debug, Clone, Copy)]
pub struct ProjectionContext<'a> {
    pub app_id: &'a str,
    pub now: DateTime<Utc>,
}

impl ProjectionContext<'_> {
    /// Current time as Unix seconds, the default for missing timestamps
    pub fn now_seconds(&self) -> i64 {
        self.now.timestamp()
    }
}

/// One raw item as seen by a projection
///
/// For listing-with-detail streams `parent` is the listed item and `child`
/// one entry of its detail response.
#[derive(Debug, Clone, Copy)]
pub struct SourceItem<'a> {
    pub parent: &'a JsonValue,
    pub child: Option<&'a JsonValue>,
}

impl<'a> SourceItem<'a> {
    /// A listed item without a detail step
    pub fn listed(item: &'a JsonValue) -> Self {
        Self {
            parent: item,
            child: None,
        }
    }

    /// The innermost item: the child if any, else the parent
    pub fn item(&self) -> &'a JsonValue {
        self.child.unwrap_or(self.parent)
    }
}

/// How a record's primary key is obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKey {
    /// Identifier supplied by the API
    Provided(String),
    /// Ordered fields hashed into an identity
    Composite(Vec<String>),
}

impl RecordKey {
    /// Resolve to the primary key value
    pub fn into_identity(self) -> String {
        match self {
            RecordKey::Provided(id) => id,
            RecordKey::Composite(parts) => record_identity(&parts),
        }
    }
}

/// A record awaiting identity assignment
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRecord {
    pub key: RecordKey,
    /// Projected fields, without the primary key and cursor field
    pub fields: JsonObject,
}

/// Everything one raw item yields
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Position in the stream's native cursor unit
    pub position: i64,
    /// Records emitted if the item is kept (several for fan-out streams)
    pub records: Vec<PendingRecord>,
}

/// Projection from a raw item to a candidate; `None` when the item is unusable
pub type ProjectFn = fn(&ProjectionContext<'_>, &SourceItem<'_>) -> Option<Candidate>;

/// Parent position used to skip detail requests, in the native unit
pub type ParentPositionFn = fn(&ProjectionContext<'_>, &JsonValue) -> i64;

/// Listing endpoint
#[derive(Debug, Clone)]
pub struct ListingRequest {
    pub path: &'static str,
    /// Key of the items array in the response body
    pub records_key: &'static str,
    /// Query parameter names for the window bounds
    pub from_param: &'static str,
    pub to_param: &'static str,
    /// Constant query parameters
    pub extra_params: &'static [(&'static str, &'static str)],
}

impl ListingRequest {
    /// Query parameters for the window
    pub fn window_params(&self, window: &SyncWindow, app_id: &str) -> Vec<(String, String)> {
        let mut params = vec![
            (self.from_param.to_string(), window.from_param()),
            (self.to_param.to_string(), window.to_param()),
            ("app_id".to_string(), app_id.to_string()),
        ];
        params.extend(
            self.extra_params
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string())),
        );
        params
    }
}

/// Per-parent detail endpoint
#[derive(Debug, Clone)]
pub struct DetailRequest {
    pub path: &'static str,
    /// Parent field holding the identifier
    pub parent_id_field: &'static str,
    /// Query parameter carrying the identifier
    pub id_param: &'static str,
    /// Key of the children array in the response body
    pub records_key: &'static str,
    pub parent_position: ParentPositionFn,
}

/// How a stream walks its listing
#[derive(Debug, Clone)]
pub enum Strategy {
    /// One listing call, optionally followed by one detail call per item
    ListingWithDetail {
        /// Page size sent with the single listing call
        page_size: Option<u32>,
        detail: Option<DetailRequest>,
    },
    /// Page-numbered listing until a short or empty page
    PagedListing { page_size: u32 },
}

impl Strategy {
    /// Paginator implementing this strategy
    pub fn paginator(&self) -> Box<dyn Paginator> {
        match self {
            Strategy::ListingWithDetail {
                page_size: Some(size),
                ..
            } => Box::new(SingleRequestPaginator::with_page_size("limit", *size)),
            Strategy::ListingWithDetail { .. } => Box::new(SingleRequestPaginator::default()),
            Strategy::PagedListing { page_size } => {
                Box::new(PageNumberPaginator::new("page", 1).with_page_size("limit", *page_size))
            }
        }
    }

    /// Detail request, if any
    pub fn detail(&self) -> Option<&DetailRequest> {
        match self {
            Strategy::ListingWithDetail { detail, .. } => detail.as_ref(),
            Strategy::PagedListing { .. } => None,
        }
    }
}

/// Everything the engine needs to sync one stream
#[derive(Debug, Clone)]
pub struct StreamDescriptor {
    pub name: StreamName,
    /// Human name used in diagnostics ("call quality")
    pub label: &'static str,
    /// What one listed item is called in diagnostics ("calls")
    pub item_noun: &'static str,
    pub primary_key: &'static str,
    pub cursor_field: &'static str,
    pub cursor_unit: CursorUnit,
    pub listing: ListingRequest,
    pub strategy: Strategy,
    pub project: ProjectFn,
    /// Record fields and their JSON types, for the catalog
    pub schema: &'static [(&'static str, &'static [&'static str])],
}

impl StreamDescriptor {
    /// JSON schema of the stream's records
    pub fn json_schema(&self) -> JsonValue {
        let properties: JsonObject = self
            .schema
            .iter()
            .map(|(name, types)| {
                let schema = if types.len() == 1 {
                    json!({ "type": types[0] })
                } else {
                    json!({ "type": types })
                };
                ((*name).to_string(), schema)
            })
            .collect();

        json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "properties": properties,
            "additionalProperties": true
        })
    }

    /// Catalog entry for the `discover` command
    pub fn catalog_entry(&self) -> JsonValue {
        json!({
            "name": self.name,
            "json_schema": self.json_schema(),
            "supported_sync_modes": [SyncMode::FullRefresh, SyncMode::Incremental],
            "source_defined_cursor": true,
            "default_cursor_field": [self.cursor_field],
            "source_defined_primary_key": [[self.primary_key]]
        })
    }
}

/// Descriptors of every stream, in sync order
pub fn all_descriptors() -> Vec<StreamDescriptor> {
    StreamName::ALL.iter().map(|name| name.descriptor()).collect()
}

//! Field access helpers for raw API items
//!
//! The API omits fields freely, so projections read everything through
//! these helpers. "Present" means not missing, not null, not `false`, not
//! `0` and not the empty string; anything else falls back to the default.

use crate::types::{JsonObject, JsonValue};
use serde_json::json;

/// JSON schema type lists used in stream catalogs
pub(crate) mod kind {
    pub const STRING: &[&str] = &["string"];
    pub const NULLABLE_STRING: &[&str] = &["string", "null"];
    pub const INTEGER: &[&str] = &["integer"];
    pub const NULLABLE_INTEGER: &[&str] = &["integer", "null"];
    pub const NUMBER: &[&str] = &["number"];
    pub const NULLABLE_NUMBER: &[&str] = &["number", "null"];
    pub const BOOLEAN: &[&str] = &["boolean"];
    pub const OBJECT: &[&str] = &["object"];
    pub const ARRAY: &[&str] = &["array"];
}

/// Look up a field, treating absent-like values as missing
pub fn present<'a>(item: &'a JsonValue, key: &str) -> Option<&'a JsonValue> {
    item.get(key).filter(|v| is_present(v))
}

fn is_present(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null | JsonValue::Bool(false) => false,
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => true,
    }
}

/// Field value or a default
pub fn value_or(item: &JsonValue, key: &str, default: JsonValue) -> JsonValue {
    present(item, key).cloned().unwrap_or(default)
}

/// Field value or a default string
pub fn text_or(item: &JsonValue, key: &str, default: &str) -> JsonValue {
    value_or(item, key, JsonValue::from(default))
}

/// Field value or `0`
pub fn number(item: &JsonValue, key: &str) -> JsonValue {
    value_or(item, key, JsonValue::from(0))
}

/// Field value or `null`
pub fn nullable(item: &JsonValue, key: &str) -> JsonValue {
    value_or(item, key, JsonValue::Null)
}

/// Field value or `{}`
pub fn object(item: &JsonValue, key: &str) -> JsonValue {
    value_or(item, key, json!({}))
}

/// Field value or `[]`
pub fn array(item: &JsonValue, key: &str) -> JsonValue {
    value_or(item, key, json!([]))
}

/// Truthiness of a field
pub fn flag(item: &JsonValue, key: &str) -> bool {
    present(item, key).is_some()
}

/// Integer reading of a field (numbers and numeric strings)
///
/// Fractional values are truncated. Zero counts as missing.
pub fn int(item: &JsonValue, key: &str) -> Option<i64> {
    let value = match present(item, key)? {
        JsonValue::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    value.filter(|v| *v != 0)
}

/// String form of a field for use in a composite key
pub fn key_part(item: &JsonValue, key: &str) -> Option<String> {
    match present(item, key)? {
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Numeric value of a field as `f64`, if it is a positive number
pub fn positive(item: &JsonValue, key: &str) -> Option<f64> {
    present(item, key)?.as_f64().filter(|f| *f > 0.0)
}

/// Build a record field map from `(name, value)` pairs
pub fn record<const N: usize>(fields: [(&str, JsonValue); N]) -> JsonObject {
    fields
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

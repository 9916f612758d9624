//! Connector configuration
//!
//! `ConnectorConfig` is the raw shape read from the user's JSON config file.
//! Every recognized option is listed here with its default. `validate()`
//! turns it into a typed `SourceConfig` once, before any stream runs.

use crate::error::{Error, Result};
use crate::streams::StreamName;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

/// Default Agora REST endpoint
pub const DEFAULT_ENDPOINT_URL: &str = "https://api.agora.io";

static DATE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("static date pattern is valid")
});

// ============================================================================
// Region
// ============================================================================

/// Agora data region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    #[default]
    Global,
    Na,
    Eu,
    Ap,
    Cn,
}

impl Region {
    /// All supported regions, in schema order
    pub const ALL: [Region; 5] = [
        Region::Global,
        Region::Na,
        Region::Eu,
        Region::Ap,
        Region::Cn,
    ];

    /// Wire name of the region
    pub fn as_str(self) -> &'static str {
        match self {
            Region::Global => "global",
            Region::Na => "na",
            Region::Eu => "eu",
            Region::Ap => "ap",
            Region::Cn => "cn",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Region::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| {
                Error::invalid_value("region", "Must be one of: global, na, eu, ap, cn")
            })
    }
}

// ============================================================================
// Raw Config
// ============================================================================

/// Connector configuration as supplied by the user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// Agora App ID
    #[serde(default)]
    pub app_id: String,

    /// Agora Customer ID (REST API key)
    #[serde(default)]
    pub customer_id: String,

    /// Agora Customer Secret (REST API secret)
    #[serde(default)]
    pub customer_secret: String,

    /// Base URL of the Agora REST API
    #[serde(default = "default_endpoint_url")]
    pub endpoint_url: String,

    /// Data region (`global`, `na`, `eu`, `ap`, `cn`)
    #[serde(default)]
    pub region: Option<String>,

    /// First day to replicate (`YYYY-MM-DD`)
    #[serde(default)]
    pub start_date: String,

    /// Streams to sync; empty means all
    #[serde(default)]
    pub streams: Vec<String>,
}

fn default_endpoint_url() -> String {
    DEFAULT_ENDPOINT_URL.to_string()
}

impl ConnectorConfig {
    /// Parse a config from a JSON value
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| Error::config(format!("Invalid config: {e}")))
    }

    /// Validate the configuration and produce its typed form
    pub fn validate(&self) -> Result<SourceConfig> {
        for (field, value) in [
            ("app_id", &self.app_id),
            ("customer_id", &self.customer_id),
            ("customer_secret", &self.customer_secret),
            ("endpoint_url", &self.endpoint_url),
            ("start_date", &self.start_date),
        ] {
            if value.trim().is_empty() {
                return Err(Error::missing_field(field));
            }
        }

        let start_date = parse_start_date(&self.start_date)?;

        let endpoint_url = url::Url::parse(&self.endpoint_url)?;
        if !matches!(endpoint_url.scheme(), "http" | "https") {
            return Err(Error::invalid_value(
                "endpoint_url",
                format!("Unsupported scheme '{}'", endpoint_url.scheme()),
            ));
        }

        let region = match self.region.as_deref() {
            None | Some("") => Region::default(),
            Some(r) => r.parse()?,
        };

        let mut streams = Vec::with_capacity(self.streams.len());
        for name in &self.streams {
            let stream: StreamName = name.parse()?;
            if !streams.contains(&stream) {
                streams.push(stream);
            }
        }

        Ok(SourceConfig {
            app_id: self.app_id.clone(),
            customer_id: self.customer_id.clone(),
            customer_secret: self.customer_secret.clone(),
            endpoint_url: self.endpoint_url.trim_end_matches('/').to_string(),
            region,
            start_date,
            streams,
        })
    }
}

/// Check the `YYYY-MM-DD` shape first, then that it is a real calendar day
fn parse_start_date(raw: &str) -> Result<NaiveDate> {
    if !DATE_PATTERN.is_match(raw) {
        return Err(Error::invalid_value(
            "start_date",
            "Invalid start_date format. Expected format: YYYY-MM-DD",
        ));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| Error::invalid_value("start_date", format!("Invalid calendar date: {e}")))
}

// ============================================================================
// Validated Config
// ============================================================================

/// Validated connector configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub app_id: String,
    pub customer_id: String,
    pub customer_secret: String,
    /// Base URL without trailing slash
    pub endpoint_url: String,
    pub region: Region,
    pub start_date: NaiveDate,
    /// Selected streams; empty means all
    pub streams: Vec<StreamName>,
}

impl SourceConfig {
    /// Streams to run, in their canonical order
    pub fn selected_streams(&self) -> Vec<StreamName> {
        if self.streams.is_empty() {
            StreamName::ALL.to_vec()
        } else {
            StreamName::ALL
                .into_iter()
                .filter(|s| self.streams.contains(s))
                .collect()
        }
    }
}

// ============================================================================
// Connection Specification
// ============================================================================

/// JSON schema describing the configuration, for the `spec` command
pub fn connection_specification() -> Value {
    let regions: Vec<&str> = Region::ALL.iter().map(|r| r.as_str()).collect();
    let streams: Vec<&str> = StreamName::ALL.iter().map(|s| s.as_str()).collect();

    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "Agora Source Spec",
        "type": "object",
        "required": ["app_id", "customer_id", "customer_secret", "endpoint_url", "start_date"],
        "properties": {
            "app_id": {
                "type": "string",
                "title": "App ID",
                "description": "Agora App ID"
            },
            "customer_id": {
                "type": "string",
                "title": "Customer ID",
                "description": "Agora Customer ID"
            },
            "customer_secret": {
                "type": "string",
                "title": "Customer Secret",
                "description": "Agora Customer Secret",
                "airbyte_secret": true
            },
            "endpoint_url": {
                "type": "string",
                "title": "API Endpoint URL",
                "description": "Agora API endpoint URL",
                "default": DEFAULT_ENDPOINT_URL
            },
            "region": {
                "type": "string",
                "title": "Region",
                "description": "Agora region (na, eu, ap, cn, or global)",
                "default": Region::default().as_str(),
                "enum": regions
            },
            "start_date": {
                "type": "string",
                "title": "Start Date",
                "description": "Date from which to start syncing data (format: YYYY-MM-DD)",
                "pattern": "^[0-9]{4}-[0-9]{2}-[0-9]{2}$",
                "examples": ["2025-01-01"]
            },
            "streams": {
                "type": "array",
                "title": "Streams",
                "description": "List of streams to sync (leave empty to sync all streams)",
                "items": { "type": "string", "enum": streams },
                "default": []
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn valid() -> ConnectorConfig {
        ConnectorConfig::from_value(json!({
            "app_id": "test_app_id",
            "customer_id": "test_customer_id",
            "customer_secret": "test_customer_secret",
            "start_date": "2025-01-01"
        }))
        .unwrap()
    }

    #[test]
    fn test_defaults_applied() {
        let config = valid().validate().unwrap();
        assert_eq!(config.endpoint_url, DEFAULT_ENDPOINT_URL);
        assert_eq!(config.region, Region::Global);
        assert_eq!(config.start_date, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(config.selected_streams(), StreamName::ALL.to_vec());
    }

    #[test_case("app_id" ; "app id")]
    #[test_case("customer_id" ; "customer id")]
    #[test_case("customer_secret" ; "customer secret")]
    #[test_case("start_date" ; "start date")]
    fn test_missing_required_field(field: &str) {
        let mut value = serde_json::to_value(valid()).unwrap();
        value.as_object_mut().unwrap().remove(field);
        let err = ConnectorConfig::from_value(value)
            .unwrap()
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { field: f } if f == field));
    }

    #[test_case("2025/01/01" ; "wrong separator")]
    #[test_case("25-01-01" ; "short year")]
    #[test_case("2025-02-30" ; "not a real day")]
    fn test_invalid_start_date(date: &str) {
        let mut config = valid();
        config.start_date = date.to_string();
        let err = config.validate().unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("start_date"));
    }

    #[test]
    fn test_invalid_region() {
        let mut config = valid();
        config.region = Some("mars".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("global, na, eu, ap, cn"));
    }

    #[test]
    fn test_region_parsing() {
        let mut config = valid();
        config.region = Some("eu".to_string());
        assert_eq!(config.validate().unwrap().region, Region::Eu);
    }

    #[test]
    fn test_invalid_endpoint_url() {
        let mut config = valid();
        config.endpoint_url = "not a url".to_string();
        assert!(matches!(config.validate(), Err(Error::InvalidUrl(_))));

        config.endpoint_url = "ftp://api.agora.io".to_string();
        assert!(config.validate().unwrap_err().is_config());
    }

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        let mut config = valid();
        config.endpoint_url = "https://api.agora.io/".to_string();
        assert_eq!(config.validate().unwrap().endpoint_url, "https://api.agora.io");
    }

    #[test]
    fn test_stream_selection_keeps_canonical_order() {
        let mut config = valid();
        config.streams = vec!["events".into(), "usage".into(), "events".into()];
        let validated = config.validate().unwrap();
        assert_eq!(validated.streams.len(), 2);
        assert_eq!(
            validated.selected_streams(),
            vec![StreamName::Usage, StreamName::Events]
        );
    }

    #[test]
    fn test_unknown_stream_rejected() {
        let mut config = valid();
        config.streams = vec!["invoices".into()];
        assert!(matches!(
            config.validate(),
            Err(Error::StreamNotFound { .. })
        ));
    }

    #[test]
    fn test_connection_specification() {
        let spec = connection_specification();
        assert_eq!(spec["required"].as_array().unwrap().len(), 5);
        assert_eq!(spec["properties"]["region"]["enum"].as_array().unwrap().len(), 5);
        assert_eq!(spec["properties"]["customer_secret"]["airbyte_secret"], true);
        assert_eq!(
            spec["properties"]["streams"]["items"]["enum"][1],
            "call_quality"
        );
    }
}

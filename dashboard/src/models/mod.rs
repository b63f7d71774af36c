//! Domain models shared by the client, the status store and the dashboard.
//!
//! - [`Integration`] - Notion, HubSpot or Airtable
//! - [`HubspotObject`] - which HubSpot CRM object a load targets
//! - [`Session`] - the (user, org) pair every backend call is scoped to
//! - [`ConnectionInfo`] - wire form of the `connection-info` endpoint
//! - [`ConnectionStatus`] - what the status store keeps per integration

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Integration
// =============================================================================

/// A third-party account connection authenticated via OAuth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Integration {
    Notion,
    Hubspot,
    Airtable,
}

impl Integration {
    /// Every integration, in dashboard order.
    pub const ALL: [Integration; 3] = [Integration::Notion, Integration::Hubspot, Integration::Airtable];

    /// Parse from a name, case-insensitively ("HubSpot", "hubspot", "HUBSPOT").
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "notion" => Some(Self::Notion),
            "hubspot" => Some(Self::Hubspot),
            "airtable" => Some(Self::Airtable),
            _ => None,
        }
    }

    /// Lower-case identifier used in backend URLs.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Notion => "notion",
            Self::Hubspot => "hubspot",
            Self::Airtable => "airtable",
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Notion => "Notion",
            Self::Hubspot => "HubSpot",
            Self::Airtable => "Airtable",
        }
    }

    /// Message a completed OAuth popup posts to its opener.
    pub fn connected_message(&self) -> String {
        format!("{}_connected", self.slug())
    }
}

impl fmt::Display for Integration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Integration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("unknown integration '{}'", s))
    }
}

// =============================================================================
// HubSpot object type
// =============================================================================

/// HubSpot CRM object a load targets, sent as `api_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HubspotObject {
    #[default]
    Contacts,
    Companies,
    Deals,
    Tickets,
}

impl HubspotObject {
    pub const ALL: [HubspotObject; 4] = [
        HubspotObject::Contacts,
        HubspotObject::Companies,
        HubspotObject::Deals,
        HubspotObject::Tickets,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contacts => "contacts",
            Self::Companies => "companies",
            Self::Deals => "deals",
            Self::Tickets => "tickets",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Contacts => "Contacts",
            Self::Companies => "Companies",
            Self::Deals => "Deals",
            Self::Tickets => "Tickets",
        }
    }
}

impl FromStr for HubspotObject {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "contacts" => Ok(Self::Contacts),
            "companies" => Ok(Self::Companies),
            "deals" => Ok(Self::Deals),
            "tickets" => Ok(Self::Tickets),
            other => Err(format!("unsupported HubSpot API type '{}'", other)),
        }
    }
}

// =============================================================================
// Session
// =============================================================================

/// The (user, org) pair every backend call is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub org_id: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>, org_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            org_id: org_id.into(),
        }
    }

    /// Form/query pairs sent with every scoped request.
    pub fn params(&self) -> [(&'static str, &str); 2] {
        [("user_id", self.user_id.as_str()), ("org_id", self.org_id.as_str())]
    }
}

// =============================================================================
// Connection info and status
// =============================================================================

/// Response body of `GET connection-info/{integration}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionInfo {
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub connected_at: Option<String>,
    #[serde(default)]
    pub credentials: Option<Value>,
}

/// What the status store keeps per integration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    pub connected: bool,
    pub connected_since: Option<DateTime<Utc>>,
    /// Credentials returned alongside the status. Never serialized outward.
    #[serde(skip)]
    pub credentials: Option<Value>,
}

impl ConnectionStatus {
    pub fn disconnected() -> Self {
        Self::default()
    }
}

impl From<ConnectionInfo> for ConnectionStatus {
    fn from(info: ConnectionInfo) -> Self {
        if !info.connected {
            return Self::disconnected();
        }
        Self {
            connected: true,
            connected_since: info.connected_at.as_deref().and_then(parse_timestamp),
            credentials: info.credentials,
        }
    }
}

/// Parse a backend timestamp. Timestamps without an offset are UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

// =============================================================================
// Load payloads
// =============================================================================

/// Body of `POST {integration}/load`: only the access token is forwarded.
pub fn load_body(credentials: &Value) -> Value {
    let mut forwarded = Map::new();
    if let Some(token) = credentials.get("access_token") {
        forwarded.insert("access_token".to_string(), token.clone());
    }
    json!({ "credentials": forwarded })
}

/// Normalize a load response: a bare array, or an object carrying `items`.
pub fn normalize_records(body: Value) -> Option<Vec<Value>> {
    match body {
        Value::Array(items) => Some(items),
        Value::Object(mut obj) => match obj.remove("items") {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        },
        _ => None,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_integration_from_name() {
        assert_eq!(Integration::from_name("HubSpot"), Some(Integration::Hubspot));
        assert_eq!(Integration::from_name("notion"), Some(Integration::Notion));
        assert_eq!(Integration::from_name(" AIRTABLE "), Some(Integration::Airtable));
        assert_eq!(Integration::from_name("salesforce"), None);
        assert!("jira".parse::<Integration>().is_err());
    }

    #[test]
    fn test_integration_names() {
        assert_eq!(Integration::Hubspot.slug(), "hubspot");
        assert_eq!(Integration::Hubspot.to_string(), "HubSpot");
        assert_eq!(Integration::Notion.connected_message(), "notion_connected");
    }

    #[test]
    fn test_hubspot_object_parse() {
        assert_eq!("Deals".parse::<HubspotObject>(), Ok(HubspotObject::Deals));
        assert_eq!(HubspotObject::default(), HubspotObject::Contacts);
        assert!("owners".parse::<HubspotObject>().is_err());
    }

    #[test]
    fn test_parse_timestamp_naive_is_utc() {
        let parsed = parse_timestamp("2024-01-15T10:00:00.123456").unwrap();
        assert_eq!(parsed.date_naive(), Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap().date_naive());
        assert_eq!(parsed.format("%H:%M:%S").to_string(), "10:00:00");
    }

    #[test]
    fn test_parse_timestamp_with_offset() {
        let parsed = parse_timestamp("2024-01-15T12:00:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_status_from_info() {
        let info: ConnectionInfo = serde_json::from_value(json!({
            "integration": "notion",
            "connected": true,
            "connected_at": "2024-01-15T10:00:00",
            "credentials": {"access_token": "secret"}
        }))
        .unwrap();
        let status = ConnectionStatus::from(info);
        assert!(status.connected);
        assert!(status.connected_since.is_some());
        assert_eq!(status.credentials.unwrap()["access_token"], "secret");

        let info: ConnectionInfo = serde_json::from_value(json!({"connected": false, "error": "boom"})).unwrap();
        assert_eq!(ConnectionStatus::from(info), ConnectionStatus::disconnected());
    }

    #[test]
    fn test_status_never_serializes_credentials() {
        let status = ConnectionStatus {
            connected: true,
            connected_since: None,
            credentials: Some(json!({"access_token": "secret"})),
        };
        let json = serde_json::to_string(&status).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("connectedSince"));
    }

    #[test]
    fn test_load_body_forwards_only_token() {
        let body = load_body(&json!({"access_token": "tok", "workspace_id": "w1"}));
        assert_eq!(body, json!({"credentials": {"access_token": "tok"}}));
        assert_eq!(load_body(&json!({})), json!({"credentials": {}}));
    }

    #[test]
    fn test_normalize_records() {
        assert_eq!(normalize_records(json!([{"id": 1}])).unwrap().len(), 1);
        assert_eq!(normalize_records(json!({"items": [{"id": 1}, {"id": 2}], "total": 2})).unwrap().len(), 2);
        assert!(normalize_records(json!({"detail": "nope"})).is_none());
        assert!(normalize_records(json!("text")).is_none());
    }
}

//! Value classification and per-cell formatting.
//!
//! Classification is first-match-wins, in this order:
//!
//! 1. null or absent       → `-`
//! 2. boolean              → `true` / `false`
//! 3. date-like string     → `15 Jan 2024 10:00:00 AM`
//! 4. UUID string          → `3fa85f64...` (copies the full value)
//! 5. absolute URL string  → link, label cut at 30 characters
//! 6. string in an id-like column → formatted as step 4
//! 7. anything else        → the raw value
//!
//! The order matters: a string that is both date-like and UUID-like is a date.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use serde::Serialize;
use serde_json::Value;

use super::dates::{format_date, looks_like_date};

/// Text shown for null or absent values.
pub const EMPTY_CELL: &str = "-";

/// Characters of an identifier kept on screen.
pub const ID_PREFIX_LEN: usize = 8;

/// Characters of a URL kept as link label.
pub const URL_LABEL_LEN: usize = 30;

static UUID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
        .expect("valid UUID regex")
});

/// Semantic category of a raw cell value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SemanticCategory {
    Null,
    Boolean,
    Date,
    Uuid,
    Url,
    PlainText,
}

/// Classify `value` found under column `key`.
pub fn classify(key: &str, value: Option<&Value>) -> SemanticCategory {
    let value = match value {
        None | Some(Value::Null) => return SemanticCategory::Null,
        Some(v) => v,
    };
    if value.is_boolean() {
        return SemanticCategory::Boolean;
    }
    let Some(text) = value.as_str() else {
        return SemanticCategory::PlainText;
    };
    if looks_like_date(text) {
        SemanticCategory::Date
    } else if is_uuid(text) {
        SemanticCategory::Uuid
    } else if is_url(text) {
        SemanticCategory::Url
    } else if is_id_column(key) {
        SemanticCategory::Uuid
    } else {
        SemanticCategory::PlainText
    }
}

/// Canonical 8-4-4-4-12 hexadecimal identifier, any case.
pub fn is_uuid(text: &str) -> bool {
    UUID.is_match(text)
}

/// Parses as an absolute URL.
pub fn is_url(text: &str) -> bool {
    Url::parse(text).is_ok()
}

/// Column names that hold identifiers.
pub fn is_id_column(key: &str) -> bool {
    let key = key.to_lowercase();
    key.contains("id") || key.contains("uuid") || key.contains("guid")
}

/// One rendered cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Cell {
    /// Null or absent value.
    Empty,
    /// Boolean or raw value.
    Text { text: String },
    /// Reformatted date.
    Date { text: String },
    /// Shortened identifier; `copy` holds the full value for the clipboard.
    Id { text: String, copy: String },
    /// Link opening `href` in a new browsing context.
    Link { text: String, href: String },
}

impl Cell {
    /// What the cell shows.
    pub fn text(&self) -> &str {
        match self {
            Cell::Empty => EMPTY_CELL,
            Cell::Text { text } | Cell::Date { text } | Cell::Id { text, .. } | Cell::Link { text, .. } => text,
        }
    }

    /// Value put on the clipboard when the copy affordance is activated.
    pub fn copy_value(&self) -> Option<&str> {
        match self {
            Cell::Id { copy, .. } => Some(copy),
            _ => None,
        }
    }

    /// Link target, for link cells.
    pub fn href(&self) -> Option<&str> {
        match self {
            Cell::Link { href, .. } => Some(href),
            _ => None,
        }
    }
}

/// Render `value` found under column `key`.
pub fn render_cell(key: &str, value: Option<&Value>) -> Cell {
    let category = classify(key, value);
    let value = match value {
        Some(v) if category != SemanticCategory::Null => v,
        _ => return Cell::Empty,
    };
    match (category, value) {
        (SemanticCategory::Boolean, Value::Bool(b)) => Cell::Text { text: b.to_string() },
        (SemanticCategory::Date, Value::String(s)) => Cell::Date {
            text: format_date(s).unwrap_or_else(|| s.clone()),
        },
        (SemanticCategory::Uuid, Value::String(s)) => Cell::Id {
            text: short_id(s),
            copy: s.clone(),
        },
        (SemanticCategory::Url, Value::String(s)) => Cell::Link {
            text: url_label(s),
            href: s.clone(),
        },
        (_, other) => Cell::Text { text: raw_text(other) },
    }
}

/// First eight characters followed by an ellipsis.
pub fn short_id(id: &str) -> String {
    let prefix: String = id.chars().take(ID_PREFIX_LEN).collect();
    format!("{}...", prefix)
}

/// URL label, cut at 30 characters when longer.
pub fn url_label(url: &str) -> String {
    if url.chars().count() > URL_LABEL_LEN {
        let prefix: String = url.chars().take(URL_LABEL_LEN).collect();
        format!("{}...", prefix)
    } else {
        url.to_string()
    }
}

/// Raw display of a value: strings verbatim, everything else as compact JSON.
pub fn raw_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

    #[test]
    fn test_null_and_absent() {
        assert_eq!(classify("name", None), SemanticCategory::Null);
        assert_eq!(classify("name", Some(&Value::Null)), SemanticCategory::Null);
        assert_eq!(render_cell("id", None).text(), "-");
    }

    #[test]
    fn test_boolean_before_everything() {
        assert_eq!(classify("is_valid", Some(&json!(true))), SemanticCategory::Boolean);
        assert_eq!(render_cell("archived", Some(&json!(false))).text(), "false");
    }

    #[test]
    fn test_uuid_shortened_with_copy_value() {
        let cell = render_cell("owner", Some(&json!(ID)));
        assert_eq!(classify("owner", Some(&json!(ID))), SemanticCategory::Uuid);
        assert_eq!(cell.text(), "3fa85f64...");
        assert_eq!(cell.copy_value(), Some(ID));
        assert!(is_uuid(&ID.to_uppercase()));
    }

    #[test]
    fn test_date_wins_over_uuid_and_url() {
        let value = json!("2024-01-15T10:00:00Z");
        assert_eq!(classify("id", Some(&value)), SemanticCategory::Date);
        assert_eq!(render_cell("id", Some(&value)).text(), "15 Jan 2024 10:00:00 AM");
    }

    #[test]
    fn test_four_digit_id_reads_as_year() {
        let value = json!("1234");
        assert_eq!(classify("hs_object_id", Some(&value)), SemanticCategory::Date);
        assert_eq!(render_cell("hs_object_id", Some(&value)).text(), "01 Jan 1234 12:00:00 AM");
        assert_eq!(render_cell("hs_object_id", Some(&json!("12345"))).text(), "12345...");
    }

    #[test]
    fn test_url_label_truncated() {
        let long = "https://www.notion.so/workspace/Project-Plan-0123456789";
        let cell = render_cell("url", Some(&json!(long)));
        assert_eq!(cell.text(), "https://www.notion.so/workspac...");
        assert_eq!(cell.href(), Some(long));

        let short = "https://acme.io";
        assert_eq!(render_cell("website", Some(&json!(short))).text(), short);
    }

    #[test]
    fn test_id_column_heuristic() {
        let cell = render_cell("hs_object_id", Some(&json!("51")));
        assert_eq!(cell.text(), "51...");
        assert_eq!(cell.copy_value(), Some("51"));

        // Numbers in id columns stay raw.
        assert_eq!(render_cell("ID", Some(&json!(51))).text(), "51");
        assert!(is_id_column("Parent_GUID"));
        assert!(!is_id_column("name"));
    }

    #[test]
    fn test_url_in_id_column_is_a_link() {
        let url = "https://api.hubapi.com/objects/51";
        assert_eq!(classify("external_id", Some(&json!(url))), SemanticCategory::Url);
    }

    #[test]
    fn test_plain_fallthrough() {
        assert_eq!(classify("name", Some(&json!("Acme"))), SemanticCategory::PlainText);
        assert_eq!(render_cell("name", Some(&json!("Acme"))).text(), "Acme");
        assert_eq!(render_cell("amount", Some(&json!(12.5))).text(), "12.5");
        assert_eq!(render_cell("tags", Some(&json!(["a", "b"]))).text(), r#"["a","b"]"#);
    }
}

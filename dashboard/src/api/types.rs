//! REST API types for the local HTTP surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::models::{normalize_records, Integration};
use crate::status::{connected_for, StatusMap};
use crate::table::{ColumnSpec, Row, TableView};

/// Connection status of one integration, as sent to browsers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEntry {
    pub integration: Integration,
    pub name: &'static str,
    pub connected: bool,
    pub connected_since: Option<DateTime<Utc>>,
    /// `1h 2m 3s`, or `-` when not connected.
    pub connected_for: String,
}

/// Status of every integration, in dashboard order.
pub fn status_entries(statuses: &StatusMap, now: DateTime<Utc>) -> Vec<StatusEntry> {
    Integration::ALL
        .iter()
        .map(|&integration| {
            let status = statuses.get(&integration);
            StatusEntry {
                integration,
                name: integration.display_name(),
                connected: status.map(|s| s.connected).unwrap_or(false),
                connected_since: status.and_then(|s| s.connected_since),
                connected_for: connected_for(status, now),
            }
        })
        .collect()
}

/// Paging of `POST /api/table`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    #[serde(default)]
    pub page: usize,
    pub page_size: Option<usize>,
}

/// Label of `POST /api/export`, used in the file name.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportQuery {
    pub label: Option<String>,
}

/// One page of a projected table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableResponse {
    pub columns: Vec<ColumnSpec>,
    pub rows: Vec<Row>,
    pub page: usize,
    pub page_count: usize,
    pub total_rows: usize,
    /// True when the view has nothing to show.
    pub empty: bool,
}

impl TableResponse {
    pub fn from_view(view: TableView, query: PageQuery, default_page_size: usize) -> Self {
        let page_size = query.page_size.unwrap_or(default_page_size).max(1);
        let rows = view.page(query.page, page_size).to_vec();
        Self {
            page: query.page,
            page_count: view.page_count(page_size),
            total_rows: view.rows.len(),
            empty: view.is_empty(),
            columns: view.columns,
            rows,
        }
    }
}

/// Records posted by a browser: a bare array or `{"items": [...]}`.
pub fn records_from_body(body: Value) -> Result<Vec<Value>, String> {
    normalize_records(body).ok_or_else(|| "expected an array of records or {\"items\": [...]}".to_string())
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "status": "error",
        "error": error,
    })
}

//! Table projection of loosely typed integration records.
//!
//! ```text
//! [Record, Record, ...] ──▶ infer_columns (first record) ──▶ [ColumnSpec]
//!                      └──▶ ColumnSpec::render per cell  ──▶ [Row { key, cells }]
//! ```
//!
//! Records are never mutated; every cell is a display value.

pub mod classify;
pub mod columns;
pub mod dates;

use serde::Serialize;
use serde_json::Value;

pub use classify::{classify, render_cell, Cell, SemanticCategory, EMPTY_CELL};
pub use columns::{column_title, infer_columns, ColumnSpec, FieldPath};
pub use dates::{format_date, looks_like_date, parse_date_like, DateLike};

/// Rows per page in table views.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// One projected row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    /// The record's `id` as text, or its index when it has none.
    pub key: String,
    pub cells: Vec<Cell>,
}

/// Row/column presentation model of a record batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableView {
    pub columns: Vec<ColumnSpec>,
    pub rows: Vec<Row>,
}

impl TableView {
    /// Nothing to show: the caller renders its empty state.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    pub fn page_count(&self, page_size: usize) -> usize {
        let page_size = page_size.max(1);
        self.rows.len().div_ceil(page_size)
    }

    /// Rows of the zero-based `page`; empty past the last page.
    pub fn page(&self, page: usize, page_size: usize) -> &[Row] {
        let page_size = page_size.max(1);
        let start = page.saturating_mul(page_size).min(self.rows.len());
        let end = start.saturating_add(page_size).min(self.rows.len());
        &self.rows[start..end]
    }
}

/// Project a record batch into a table view.
pub fn project(records: &[Value]) -> TableView {
    let columns = infer_columns(records);
    let rows = records
        .iter()
        .enumerate()
        .map(|(index, record)| Row {
            key: row_key(record, index),
            cells: columns.iter().map(|column| column.render(record)).collect(),
        })
        .collect();
    TableView { columns, rows }
}

fn row_key(record: &Value, index: usize) -> String {
    match record.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => index.to_string(),
    }
}

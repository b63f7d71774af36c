//! Plain-text rendering for the terminal.

use chrono::{DateTime, Utc};
use std::fmt::Write as _;

use crate::models::Integration;
use crate::status::{connected_for, StatusMap};
use crate::table::{Row, TableView};

/// Shown instead of a table when there is nothing to display.
pub const EMPTY_STATE: &str = "No data to display";

/// Render one page of a table view, with a page footer when there is more
/// than one page.
pub fn render_table(view: &TableView, page: usize, page_size: usize) -> String {
    if view.is_empty() {
        return format!("{}\n", EMPTY_STATE);
    }

    let headers: Vec<&str> = view.columns.iter().map(|c| c.title.as_str()).collect();
    let rows: Vec<Vec<&str>> = view
        .page(page, page_size)
        .iter()
        .map(|row: &Row| row.cells.iter().map(|cell| cell.text()).collect())
        .collect();

    let mut out = grid(&headers, &rows);
    let pages = view.page_count(page_size);
    if pages > 1 {
        let _ = writeln!(
            out,
            "Page {} of {} ({} rows)",
            page.min(pages - 1) + 1,
            pages,
            view.rows.len()
        );
    }
    out
}

/// Render the connection status of every integration.
pub fn render_status(statuses: &StatusMap, now: DateTime<Utc>) -> String {
    let rows: Vec<Vec<String>> = Integration::ALL
        .iter()
        .map(|integration| {
            let status = statuses.get(integration);
            let state = match status {
                Some(s) if s.connected => "Connected",
                Some(_) => "Not connected",
                None => "Unknown",
            };
            vec![
                integration.display_name().to_string(),
                state.to_string(),
                connected_for(status, now),
            ]
        })
        .collect();
    let rows: Vec<Vec<&str>> = rows.iter().map(|r| r.iter().map(String::as_str).collect()).collect();
    grid(&["Integration", "Status", "Connected For"], &rows)
}

fn grid(headers: &[&str], rows: &[Vec<&str>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let separator: String = widths
        .iter()
        .map(|w| "-".repeat(w + 2))
        .collect::<Vec<_>>()
        .join("+");

    let mut out = String::new();
    push_line(&mut out, headers, &widths);
    let _ = writeln!(out, "{}", separator);
    for row in rows {
        push_line(&mut out, row, &widths);
    }
    out
}

fn push_line(out: &mut String, cells: &[&str], widths: &[usize]) {
    let line = widths
        .iter()
        .enumerate()
        .map(|(i, width)| {
            let cell = cells.get(i).copied().unwrap_or("");
            format!(" {:<width$} ", cell, width = width)
        })
        .collect::<Vec<_>>()
        .join("|");
    let _ = writeln!(out, "{}", line.trim_end());
}

//! "Connected for" text.

use chrono::{DateTime, Utc};

use crate::models::ConnectionStatus;
use crate::table::EMPTY_CELL;

/// Format the time between `since` and `now`: `1h 2m 3s`, `2m 3s` or `3s`.
///
/// A `since` in the future renders `0s`.
pub fn format_elapsed(since: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let total = (now - since).num_seconds().max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// "Connected For" cell of a status table; `-` when unknown or disconnected.
pub fn connected_for(status: Option<&ConnectionStatus>, now: DateTime<Utc>) -> String {
    match status {
        Some(ConnectionStatus {
            connected: true,
            connected_since: Some(since),
            ..
        }) => format_elapsed(*since, now),
        _ => EMPTY_CELL.to_string(),
    }
}

//! Strict date recognition and display formatting.
//!
//! A string is date-like when it matches, in full, one of:
//!
//! | Pattern        | Example                      |
//! |----------------|------------------------------|
//! | ISO-8601       | `2024-01-15T10:00:00Z`       |
//! | `YYYY-MM-DD`   | `2024-01-15`                 |
//! | `DD/MM/YYYY`   | `15/01/2024`                 |
//! | `MM/DD/YYYY`   | `01/15/2024`                 |
//! | `YYYY/MM/DD`   | `2024/01/15`                 |
//!
//! ISO-8601 covers both the extended and the basic notation:
//!
//! | Date form                    | Extended        | Basic        | Time allowed |
//! |------------------------------|-----------------|--------------|--------------|
//! | calendar                     | `2024-01-15`    | `20240115`   | yes          |
//! | calendar, expanded year      | `+002024-01-15` | `+0020240115`| yes          |
//! | week with weekday            | `2024-W03-1`    | `2024W031`   | yes          |
//! | ordinal                      | `2024-015`      | `2024015`    | yes          |
//! | week                         | `2024-W03`      | `2024W03`    | no           |
//! | month                        | `2024-01`       | `202401`     | no           |
//! | year                         |                 | `2024`       | no           |
//!
//! A time follows after `T` or a space, written in the same notation as the
//! date (`10:30:00` or `103000`), with an optional `Z` or `±hh[[:]mm]` offset.
//!
//! Parsing is strict: fields have fixed widths, digits are ASCII and
//! out-of-range values (`2024-02-30`, `25:00`) are rejected. Patterns are
//! tried in the order above, so `01/02/2024` reads as 1 February.
//!
//! Date-like values display as `DD Mon YYYY hh:mm:ss AM/PM`. Timestamps that
//! carry an offset are shown in UTC, naive ones as written.

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;

/// Display pattern for date-like cells: `15 Jan 2024 10:00:00 AM`.
pub const DISPLAY_FORMAT: &str = "%d %b %Y %I:%M:%S %p";

static ISO_EXTENDED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<date>(?:[+-][0-9]{6}|[0-9]{4})-(?:[0-9]{2}-[0-9]{2}|W[0-9]{2}-[0-9]|W[0-9]{2}|[0-9]{3}|[0-9]{2}))(?:[T ](?P<time>[0-9]{2}(?::[0-9]{2}(?::[0-9]{2}(?:[.,][0-9]+)?)?)?)(?P<offset>Z|[+-][0-9]{2}(?::?[0-9]{2})?)?)?$",
    )
    .expect("valid extended ISO-8601 regex")
});

static ISO_BASIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<date>(?:[+-][0-9]{6}|[0-9]{4})(?:[0-9]{4}|W[0-9]{3}|W[0-9]{2}|[0-9]{3}|[0-9]{2})?)(?:[T ](?P<time>[0-9]{2}(?:[0-9]{2}(?:[0-9]{2}(?:[.,][0-9]+)?)?)?)(?P<offset>Z|[+-][0-9]{2}(?::?[0-9]{2})?)?)?$",
    )
    .expect("valid basic ISO-8601 regex")
});

static SLASH_DAY_FIRST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]{2})/([0-9]{2})/([0-9]{4})$").expect("valid slash date regex"));

static SLASH_YEAR_FIRST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]{4})/([0-9]{2})/([0-9]{2})$").expect("valid slash date regex"));

/// A recognised date-like value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateLike {
    /// Wall-clock date and time as written.
    pub naive: NaiveDateTime,
    /// Offset written with the value, if any.
    pub offset: Option<FixedOffset>,
}

impl DateLike {
    /// The instant to display: converted to UTC when an offset was given.
    pub fn display_time(&self) -> NaiveDateTime {
        match self.offset {
            Some(offset) => self.naive - offset,
            None => self.naive,
        }
    }

    /// Render in [`DISPLAY_FORMAT`].
    pub fn display(&self) -> String {
        self.display_time().format(DISPLAY_FORMAT).to_string()
    }
}

/// Recognise `raw` as one of the supported date patterns.
pub fn parse_date_like(raw: &str) -> Option<DateLike> {
    parse_iso_8601(raw)
        .or_else(|| parse_day_month_year(raw))
        .or_else(|| parse_month_day_year(raw))
        .or_else(|| parse_year_month_day(raw))
}

/// True when `raw` is date-like.
pub fn looks_like_date(raw: &str) -> bool {
    parse_date_like(raw).is_some()
}

/// Reformat a date-like string for display, `None` when it is not date-like.
pub fn format_date(raw: &str) -> Option<String> {
    parse_date_like(raw).map(|d| d.display())
}

fn parse_iso_8601(raw: &str) -> Option<DateLike> {
    let caps = ISO_EXTENDED.captures(raw).or_else(|| ISO_BASIC.captures(raw))?;
    let (date, allows_time) = parse_iso_date(caps.name("date")?.as_str())?;
    let time = match caps.name("time") {
        Some(_) if !allows_time => return None,
        Some(t) => parse_iso_time(t.as_str())?,
        None => NaiveTime::MIN,
    };
    let offset = match caps.name("offset") {
        Some(o) => Some(parse_offset(o.as_str())?),
        None => None,
    };
    Some(DateLike {
        naive: date.and_time(time),
        offset,
    })
}

/// Parse the date part of an ISO-8601 value, already matched by one of the
/// grammars. Also returns whether a time may follow.
fn parse_iso_date(s: &str) -> Option<(NaiveDate, bool)> {
    let (year, rest, expanded) = match s.strip_prefix(|c: char| c == '+' || c == '-') {
        Some(unsigned) => {
            let year: i32 = unsigned.get(..6)?.parse().ok()?;
            let year = if s.starts_with('-') { -year } else { year };
            (year, &unsigned[6..], true)
        }
        None => (s.get(..4)?.parse().ok()?, &s[4..], false),
    };
    let rest = rest.strip_prefix('-').unwrap_or(rest);

    if let Some(week) = rest.strip_prefix('W') {
        if expanded {
            return None;
        }
        let digits: String = week.chars().filter(|c| c.is_ascii_digit()).collect();
        let number: u32 = digits.get(..2)?.parse().ok()?;
        return match digits.get(2..) {
            Some(day) if !day.is_empty() => {
                NaiveDate::from_isoywd_opt(year, number, iso_weekday(day.parse().ok()?)?).map(|d| (d, true))
            }
            _ => NaiveDate::from_isoywd_opt(year, number, Weekday::Mon).map(|d| (d, false)),
        };
    }

    let digits: String = rest.chars().filter(|c| c.is_ascii_digit()).collect();
    match (digits.len(), expanded) {
        (4, _) => ymd_parts(year, &digits[..2], &digits[2..]).map(|d| (d, true)),
        (3, false) => NaiveDate::from_yo_opt(year, digits.parse().ok()?).map(|d| (d, true)),
        (2, false) => ymd_parts(year, &digits, "01").map(|d| (d, false)),
        (0, false) => NaiveDate::from_ymd_opt(year, 1, 1).map(|d| (d, false)),
        _ => None,
    }
}

fn iso_weekday(n: u32) -> Option<Weekday> {
    match n {
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        7 => Some(Weekday::Sun),
        _ => None,
    }
}

fn parse_iso_time(s: &str) -> Option<NaiveTime> {
    let (clock, fraction) = match s.find(|c: char| c == '.' || c == ',') {
        Some(i) => (&s[..i], Some(&s[i + 1..])),
        None => (s, None),
    };
    let digits: String = clock.chars().filter(|c| c.is_ascii_digit()).collect();
    let field = |range: std::ops::Range<usize>| -> Option<u32> {
        match digits.get(range) {
            Some(d) if !d.is_empty() => d.parse().ok(),
            _ => Some(0),
        }
    };
    let hour = field(0..2)?;
    let minute = field(2..4)?;
    let second = field(4..6)?;
    let nanos = match fraction {
        Some(f) => {
            let mut padded: String = f.chars().take(9).collect();
            while padded.len() < 9 {
                padded.push('0');
            }
            padded.parse().ok()?
        }
        None => 0,
    };
    NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)
}

fn parse_offset(s: &str) -> Option<FixedOffset> {
    if s == "Z" {
        return FixedOffset::east_opt(0);
    }
    let sign = if s.starts_with('-') { -1 } else { 1 };
    let digits: String = s[1..].chars().filter(|c| c.is_ascii_digit()).collect();
    let hours: i32 = digits.get(0..2)?.parse().ok()?;
    let minutes: i32 = match digits.get(2..4) {
        Some(m) => m.parse().ok()?,
        None => 0,
    };
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn parse_day_month_year(raw: &str) -> Option<DateLike> {
    let caps = SLASH_DAY_FIRST.captures(raw)?;
    ymd(&caps[3], &caps[2], &caps[1]).map(at_midnight)
}

fn parse_month_day_year(raw: &str) -> Option<DateLike> {
    let caps = SLASH_DAY_FIRST.captures(raw)?;
    ymd(&caps[3], &caps[1], &caps[2]).map(at_midnight)
}

fn parse_year_month_day(raw: &str) -> Option<DateLike> {
    let caps = SLASH_YEAR_FIRST.captures(raw)?;
    ymd(&caps[1], &caps[2], &caps[3]).map(at_midnight)
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    ymd_parts(year.parse().ok()?, month, day)
}

fn ymd_parts(year: i32, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month.parse().ok()?, day.parse().ok()?)
}

fn at_midnight(date: NaiveDate) -> DateLike {
    DateLike {
        naive: date.and_time(NaiveTime::MIN),
        offset: None,
    }
}

//! Batch dates: normalized to a calendar day at ingestion when the source format is known.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source formats accepted for `BatchDate`, tried in order.
///
/// `MM/DD/YYYY` precedes `DD/MM/YYYY`, so an ambiguous `03/04/2024` is March 4th.
/// A timestamp keeps only its date part.
pub const DATE_FORMATS: [&str; 5] = [
    "%Y-%m-%d",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%d/%m/%Y",
];

/// The date a settlement batch was closed.
///
/// Ordering puts every calendar day before every unrecognized value; days sort
/// chronologically and raw values lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchDate {
    Day(NaiveDate),
    Raw(String),
}

impl BatchDate {
    /// Parse a date as it appears in a batch file. Never fails: unknown forms are kept raw.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if let Some(day) = parse_day(s) {
            return BatchDate::Day(day);
        }
        BatchDate::Raw(s.to_string())
    }

    pub fn day(&self) -> Option<NaiveDate> {
        match self {
            BatchDate::Day(d) => Some(*d),
            BatchDate::Raw(_) => None,
        }
    }
}

fn parse_day(s: &str) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(s, fmt).ok().or_else(|| {
            NaiveDateTime::parse_from_str(s, fmt)
                .ok()
                .map(|dt| dt.date())
        })
    })
}

impl From<NaiveDate> for BatchDate {
    fn from(d: NaiveDate) -> Self {
        BatchDate::Day(d)
    }
}

impl From<&str> for BatchDate {
    fn from(s: &str) -> Self {
        BatchDate::parse(s)
    }
}

impl fmt::Display for BatchDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchDate::Day(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            BatchDate::Raw(s) => f.write_str(s),
        }
    }
}

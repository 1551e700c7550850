//! Inclusive date-range filtering over entry creation times.
//!
//! The date picker supplies raw bounds; a missing or unparsable bound makes
//! the filter a deliberate no-op (permissive fallback, not an error).
//! Entries without a parsable `createdAt` are excluded only while a valid
//! range is active.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::normalize;
use crate::types::Entry;

/// An optional [start, end] date window. The window covers
/// `start 00:00:00` through `end 23:59:59` inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Parse picker-supplied bounds. Unparsable input becomes an open bound.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Self {
        let parse_bound = |label: &str, raw: Option<&str>| {
            raw.and_then(|s| {
                let parsed = normalize::parse_date(s);
                if parsed.is_none() && !s.trim().is_empty() {
                    log::debug!("invalid {} date '{}'; range filter disabled", label, s);
                }
                parsed
            })
        };
        DateRange {
            start: parse_bound("start", start),
            end: parse_bound("end", end),
        }
    }

    /// The UTC window, or `None` when either bound is missing.
    fn window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = self.start?.and_hms_opt(0, 0, 0)?;
        let end = self.end?.and_hms_opt(23, 59, 59)?;
        Some((Utc.from_utc_datetime(&start), Utc.from_utc_datetime(&end)))
    }
}

/// Select entries whose `createdAt` falls inside the range, preserving
/// order. With an incomplete range this passes everything through.
pub fn filter_by_range(entries: Vec<Entry>, range: &DateRange) -> Vec<Entry> {
    let Some((window_start, window_end)) = range.window() else {
        return entries;
    };

    entries
        .into_iter()
        .filter(|entry| match entry.created_at {
            Some(created) => created >= window_start && created <= window_end,
            // No parsable creation time: out of any bounded range.
            None => false,
        })
        .collect()
}

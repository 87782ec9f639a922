//! Calendar date parsing at the request boundary.
//!
//! Everything past this module works with [`chrono::NaiveDate`]; strings are
//! only accepted here.

use chrono::{NaiveDate, NaiveDateTime};

/// Canonical wire format for calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A date string or range failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("invalid date '{input}': expected YYYY-MM-DD")]
    InvalidDate { input: String },

    #[error("start date {start} is after end date {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
}

/// Parse an ISO calendar date.
///
/// A full `YYYY-MM-DDTHH:MM:SS` timestamp is also accepted and truncated to
/// its date, since form clients occasionally submit one.
pub fn parse_date(input: &str) -> Result<NaiveDate, FormatError> {
    let trimmed = input.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, DATETIME_FORMAT).map(|dt| dt.date()))
        .map_err(|_| FormatError::InvalidDate {
            input: input.to_string(),
        })
}

/// Format a date in the canonical wire format.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

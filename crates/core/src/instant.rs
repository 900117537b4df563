//! ISO-8601 instant parsing.
//!
//! Upstream records carry timestamps as strings written by several clients:
//! full RFC 3339 values, naive date-times without an offset, and bare dates
//! picked from a date input. All of them are normalized to UTC here.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::{DomainError, DomainResult};

/// Which end of a window a timestamp describes.
///
/// Only matters for date-only values: a bare date used as an upper bound
/// covers the whole day.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InstantBound {
    /// Lower bound, or a point in time: a bare date means 00:00:00 UTC.
    Start,
    /// Upper bound: a bare date means the last instant of that day.
    End,
}

const NAIVE_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Parse an ISO-8601 timestamp into a UTC instant.
pub fn parse_instant(raw: &str, bound: InstantBound) -> DomainResult<DateTime<Utc>> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(DomainError::invalid_instant(raw));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in NAIVE_DATE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| DomainError::invalid_instant(raw))?;
    let naive = match bound {
        InstantBound::Start => date.and_hms_opt(0, 0, 0),
        InstantBound::End => date.and_hms_nano_opt(23, 59, 59, 999_999_999),
    };
    naive
        .map(|n| n.and_utc())
        .ok_or_else(|| DomainError::invalid_instant(raw))
}

//! Deadline normalization and formatting.
//!
//! Deadlines arrive either as chrono values or as strings (typically
//! literals next to the code they guard). Everything is normalized to a
//! UTC [`Timestamp`] before the guard computes its delta.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::error::TimebombError;
use crate::types::Timestamp;

/// Format used when a deadline is quoted in a message, e.g.
/// `Thu, 01 Jan 2026 00:00:00 GMT`.
const MESSAGE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Naive (zone-less) string forms, interpreted as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Date-only string form, interpreted as UTC midnight.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Conversion of a deadline input into an absolute UTC timestamp.
pub trait IntoDeadline {
    fn into_deadline(self) -> Result<Timestamp, TimebombError>;
}

impl IntoDeadline for Timestamp {
    fn into_deadline(self) -> Result<Timestamp, TimebombError> {
        Ok(self)
    }
}

impl IntoDeadline for &Timestamp {
    fn into_deadline(self) -> Result<Timestamp, TimebombError> {
        Ok(*self)
    }
}

impl IntoDeadline for DateTime<FixedOffset> {
    fn into_deadline(self) -> Result<Timestamp, TimebombError> {
        Ok(self.with_timezone(&Utc))
    }
}

impl IntoDeadline for DateTime<Local> {
    fn into_deadline(self) -> Result<Timestamp, TimebombError> {
        Ok(self.with_timezone(&Utc))
    }
}

impl IntoDeadline for NaiveDateTime {
    fn into_deadline(self) -> Result<Timestamp, TimebombError> {
        Ok(Utc.from_utc_datetime(&self))
    }
}

impl IntoDeadline for NaiveDate {
    fn into_deadline(self) -> Result<Timestamp, TimebombError> {
        self.and_time(NaiveTime::default()).into_deadline()
    }
}

impl IntoDeadline for &str {
    fn into_deadline(self) -> Result<Timestamp, TimebombError> {
        parse_deadline(self)
    }
}

impl IntoDeadline for String {
    fn into_deadline(self) -> Result<Timestamp, TimebombError> {
        parse_deadline(&self)
    }
}

impl IntoDeadline for &String {
    fn into_deadline(self) -> Result<Timestamp, TimebombError> {
        parse_deadline(self)
    }
}

/// Parse a deadline string.
///
/// Accepted forms, tried in order:
/// 1. RFC 3339 (`2026-01-01T00:00:00+02:00`)
/// 2. RFC 2822 (`Thu, 01 Jan 2026 00:00:00 GMT`), so quoted deadlines
///    round-trip through [`format_deadline`]
/// 3. Naive date-time (`2026-01-01T08:30:00`, `2026-01-01 08:30:00`), as UTC
/// 4. Date only (`2026-01-01`), as UTC midnight
///
/// On failure the RFC 3339 parse error is reported.
pub fn parse_deadline(input: &str) -> Result<Timestamp, TimebombError> {
    let trimmed = input.trim();

    let rfc3339_err = match DateTime::parse_from_rfc3339(trimmed) {
        Ok(dt) => return Ok(dt.with_timezone(&Utc)),
        Err(e) => e,
    };

    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return naive.into_deadline();
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        return date.into_deadline();
    }

    Err(TimebombError::InvalidDeadline {
        input: input.to_string(),
        source: rfc3339_err,
    })
}

/// Render a deadline the way messages quote it.
pub fn format_deadline(deadline: &Timestamp) -> String {
    deadline.format(MESSAGE_FORMAT).to_string()
}

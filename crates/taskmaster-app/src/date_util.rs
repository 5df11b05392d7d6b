//! Parsing and formatting helpers for user-facing dates.

use taskmaster_core::is_storable;
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, UtcOffset};

/// Error returned when a date string cannot be understood.
#[derive(Debug, Error)]
pub enum DateParseError {
    /// Neither `YYYY-MM-DD` nor RFC 3339.
    #[error("invalid date '{input}' (expected YYYY-MM-DD or RFC 3339)")]
    Invalid {
        /// Text as given.
        input: String,
    },
    /// A valid date whose year is outside 0..=9999.
    #[error("date '{input}' is out of range (years 0-9999)")]
    OutOfRange {
        /// Text as given.
        input: String,
    },
}

/// Parse an RFC 3339 timestamp.
///
/// # Errors
/// Returns the underlying parse error for malformed input.
pub fn parse_timestamp(s: &str) -> Result<OffsetDateTime, time::error::Parse> {
    OffsetDateTime::parse(s.trim(), &Rfc3339)
}

/// Normalize timestamps to UTC to avoid offset mismatches across interfaces.
#[must_use]
pub const fn normalize_timestamp(dt: OffsetDateTime) -> OffsetDateTime {
    dt.to_offset(UtcOffset::UTC)
}

/// Parse a due date typed by the user.
///
/// A bare `YYYY-MM-DD` means midnight UTC on that day; anything else must be
/// RFC 3339 and is normalized to UTC. Years the task file cannot store are
/// rejected.
///
/// # Errors
/// Returns [`DateParseError::Invalid`] when neither form matches, and
/// [`DateParseError::OutOfRange`] for years outside 0..=9999.
pub fn parse_due_date(s: &str) -> Result<OffsetDateTime, DateParseError> {
    let trimmed = s.trim();
    let parsed = match Date::parse(trimmed, format_description!("[year]-[month]-[day]")) {
        Ok(date) => date.midnight().assume_utc(),
        // Re-derived from the instant so a UTC shift past year 9999 errors instead of panicking.
        Err(_) => parse_timestamp(trimmed)
            .ok()
            .and_then(|dt| {
                OffsetDateTime::from_unix_timestamp_nanos(dt.unix_timestamp_nanos()).ok()
            })
            .ok_or_else(|| DateParseError::Invalid {
                input: trimmed.to_owned(),
            })?,
    };
    if !is_storable(parsed) {
        return Err(DateParseError::OutOfRange {
            input: trimmed.to_owned(),
        });
    }
    Ok(parsed)
}

/// Render the calendar day of `dt` as `YYYY-MM-DD`.
#[must_use]
pub fn format_date(dt: OffsetDateTime) -> String {
    let date = dt.date();
    format!("{:04}-{:02}-{:02}", date.year(), u8::from(date.month()), date.day())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn bare_dates_mean_midnight_utc() {
        let parsed = parse_due_date(" 2024-01-10 ").unwrap_or_else(|err| panic!("{err}"));
        assert_eq!(parsed, datetime!(2024-01-10 00:00 UTC));
    }

    #[test]
    fn rfc3339_inputs_are_normalized_to_utc() {
        let parsed =
            parse_due_date("2024-01-10T09:00:00+09:00").unwrap_or_else(|err| panic!("{err}"));
        assert_eq!(parsed, datetime!(2024-01-10 00:00 UTC));
        assert!(parsed.offset().is_utc());
    }

    #[test]
    fn garbage_is_rejected_with_input() {
        let err = parse_due_date("next tuesday").err();
        assert!(matches!(err, Some(DateParseError::Invalid { input }) if input == "next tuesday"));
        assert!(parse_due_date("2024-13-01").is_err());
    }

    #[test]
    fn years_outside_the_file_format_are_rejected() {
        assert!(matches!(
            parse_due_date("-0001-01-01"),
            Err(DateParseError::OutOfRange { input }) if input == "-0001-01-01"
        ));
        assert!(parse_due_date("0000-01-01").is_ok());
        assert!(parse_due_date("9999-12-31").is_ok());
    }

    #[test]
    fn format_date_prints_calendar_day() {
        assert_eq!(format_date(datetime!(2024-03-05 23:59 UTC)), "2024-03-05");
    }
}

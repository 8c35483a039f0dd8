//! UTC time helpers with the service-wide text formats.

use crate::core::error::{ToolkitError, ToolkitResult};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

/// `2024-03-01 13:45:00`
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// `2024-03-01`
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Parse [`DEFAULT_TIME_FORMAT`] text as a UTC instant
pub fn parse_time(s: &str) -> ToolkitResult<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, DEFAULT_TIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| ToolkitError::invalid_input(format!("Invalid time '{}': {}", s, e)))
}

/// Parse [`DEFAULT_DATE_FORMAT`] text as UTC midnight of that date
pub fn parse_date(s: &str) -> ToolkitResult<DateTime<Utc>> {
    NaiveDate::parse_from_str(s, DEFAULT_DATE_FORMAT)
        .map(|date| date.and_time(chrono::NaiveTime::MIN).and_utc())
        .map_err(|e| ToolkitError::invalid_input(format!("Invalid date '{}': {}", s, e)))
}

pub fn format_time(t: &DateTime<Utc>) -> String {
    t.format(DEFAULT_TIME_FORMAT).to_string()
}

pub fn format_date(t: &DateTime<Utc>) -> String {
    t.format(DEFAULT_DATE_FORMAT).to_string()
}

/// Midnight at the start of `t`'s day
pub fn begin_of_date(t: &DateTime<Utc>) -> DateTime<Utc> {
    t.date_naive().and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Midnight at the start of the following day
pub fn end_of_date(t: &DateTime<Utc>) -> DateTime<Utc> {
    begin_of_date(t) + Duration::hours(24)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_format_time() {
        let t = parse_time("2024-03-01 13:45:09").unwrap();
        assert_eq!(format_time(&t), "2024-03-01 13:45:09");
        assert_eq!(format_date(&t), "2024-03-01");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_time("2024-03-01"),
            Err(ToolkitError::InvalidInput { .. })
        ));
        assert!(matches!(
            parse_date("03/01/2024"),
            Err(ToolkitError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_day_bounds() {
        let t = parse_time("2024-02-29 23:59:59").unwrap();
        assert_eq!(begin_of_date(&t), parse_date("2024-02-29").unwrap());
        assert_eq!(end_of_date(&t), parse_date("2024-03-01").unwrap());
        assert_eq!(end_of_date(&t) - begin_of_date(&t), Duration::hours(24));
    }
}

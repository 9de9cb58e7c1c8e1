//! Issue date parsing for NF-e documents.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::patterns::COMPACT_OFFSET;

/// Parse the issue date into a calendar date, discarding the time of day.
///
/// `dhEmi` (layout 3.10+) is an RFC 3339 date-time; the date is taken in the
/// offset the document was written with, never converted to another zone.
/// `dEmi` (layout 2.00) is a plain `YYYY-MM-DD`. Anything else is tried
/// against the configured chrono formats in order.
pub fn parse_issue_date(s: &str, formats: &[String]) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    if COMPACT_OFFSET.is_match(s) {
        if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z") {
            return Some(dt.date_naive());
        }
    }

    for format in formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.date());
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn formats() -> Vec<String> {
        vec!["%Y-%m-%dT%H:%M:%S".to_string(), "%Y-%m-%d".to_string()]
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_dh_emi() {
        assert_eq!(
            parse_issue_date("2024-01-15T10:30:00-03:00", &formats()),
            Some(ymd(2024, 1, 15))
        );
    }

    #[test]
    fn test_parse_keeps_document_offset() {
        // 23:30 in Brasília is already the next day in UTC
        assert_eq!(
            parse_issue_date("2024-01-15T23:30:00-03:00", &formats()),
            Some(ymd(2024, 1, 15))
        );
    }

    #[test]
    fn test_parse_compact_offset() {
        assert_eq!(
            parse_issue_date("2024-03-01T08:00:00-0300", &formats()),
            Some(ymd(2024, 3, 1))
        );
    }

    #[test]
    fn test_parse_d_emi() {
        assert_eq!(parse_issue_date("2010-07-31", &formats()), Some(ymd(2010, 7, 31)));
    }

    #[test]
    fn test_parse_naive_date_time() {
        assert_eq!(
            parse_issue_date("2024-01-15T10:30:00", &formats()),
            Some(ymd(2024, 1, 15))
        );
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(parse_issue_date("15/01/2024", &formats()), None);
        assert_eq!(parse_issue_date("2024-02-30", &formats()), None);
        assert_eq!(parse_issue_date("", &formats()), None);
    }

    #[test]
    fn test_custom_format() {
        let formats = vec!["%d/%m/%Y".to_string()];
        assert_eq!(parse_issue_date("15/01/2024", &formats), Some(ymd(2024, 1, 15)));
    }
}

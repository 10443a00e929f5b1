//! Time parsing and formatting for InfluxQL time clauses

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::{CoreError, CoreResult, Timestamp};

const DB_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a user or server supplied time. Inputs without an offset are
/// taken to be UTC.
pub fn parse_time(s: &str) -> CoreResult<Timestamp> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in [DB_TIME_FORMAT, "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| CoreError::InvalidTime(s.to_string()))
}

/// Format a timestamp the way it is written into `WHERE time ...` clauses.
pub fn format_db_time(time: &Timestamp) -> String {
    time.format(DB_TIME_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_formats_agree() {
        let expected = parse_time("2019-06-01T12:30:00Z").unwrap();
        assert_eq!(parse_time("2019-06-01 12:30:00").unwrap(), expected);
        assert_eq!(parse_time("2019-06-01T12:30:00").unwrap(), expected);
        assert_eq!(parse_time("2019-06-01T05:30:00-07:00").unwrap(), expected);
        assert_eq!(
            parse_time("2019-06-01").unwrap(),
            parse_time("2019-06-01 00:00:00").unwrap()
        );
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(
            parse_time("yesterday"),
            Err(CoreError::InvalidTime(_))
        ));
    }

    #[test]
    fn test_format_db_time() {
        let t = parse_time("2019-06-01T05:30:00-07:00").unwrap();
        assert_eq!(format_db_time(&t), "2019-06-01 12:30:00");
    }
}

//! Codec for the API's fixed `YYYY-MM-DDTHH:MM:SSZ` date-time strings.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::error::CapsuleError;

/// The only date-time layout the API produces and accepts.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Parses an API date-time string into a UTC instant.
pub fn parse(s: &str) -> Result<DateTime<Utc>, CapsuleError> {
    let naive = NaiveDateTime::parse_from_str(s, DATE_TIME_FORMAT)
        .map_err(|e| CapsuleError::Format(format!("invalid date-time `{}`: {}", s, e)))?;
    Ok(Utc.from_utc_datetime(&naive))
}

/// Parses an API date-time string and keeps only its date.
pub fn parse_date(s: &str) -> Result<NaiveDate, CapsuleError> {
    parse(s).map(|dt| dt.date_naive())
}

/// Formats a date the way date-valued custom fields are sent: midnight UTC.
pub fn format(d: NaiveDate) -> String {
    format!("{}T00:00:00Z", d.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn parse_valid() {
        let dt = parse("2020-01-02T03:04:05Z").unwrap();
        assert_eq!(dt.date_naive(), NaiveDate::from_ymd_opt(2020, 1, 2).unwrap());
        assert_eq!(dt.hour(), 3);
        assert_eq!(dt.second(), 5);
    }

    #[test]
    fn parse_rejects_other_layouts() {
        for bad in [
            "2020-01-02",
            "2020-01-02 03:04:05",
            "2020-01-02T03:04:05+00:00",
            "2020-01-02T03:04:05",
            "02/01/2020",
            "",
        ] {
            assert!(
                matches!(parse(bad), Err(CapsuleError::Format(_))),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn format_is_midnight() {
        let d = NaiveDate::from_ymd_opt(2021, 3, 5).unwrap();
        assert_eq!(format(d), "2021-03-05T00:00:00Z");
    }

    #[test]
    fn format_then_parse_recovers_date() {
        let d = NaiveDate::from_ymd_opt(1999, 12, 31).unwrap();
        let dt = parse(&format(d)).unwrap();
        assert_eq!(dt.date_naive(), d);
        assert_eq!(dt.num_seconds_from_midnight(), 0);
    }
}

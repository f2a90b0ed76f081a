// Utility functions
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};

/// Parses an ISO-8601 timestamp into `DateTime<Utc>`, if possible. Strings
/// without an offset are taken as UTC.
pub fn parse_datetime(date_str: &str) -> Option<DateTime<Utc>> {
    let date_str = date_str.trim();
    DateTime::parse_from_rfc3339(date_str)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(date_str, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// Monotonic day number used as the regression feature.
pub fn date_ordinal(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinal_is_monotonic_across_month_boundary() {
        let jan31 = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let feb1 = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert_eq!(date_ordinal(feb1) - date_ordinal(jan31), 1.0);
    }

    #[test]
    fn parses_rfc3339_with_offset() {
        let dt = parse_datetime("2024-01-05T12:00:00+02:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-01-05T10:00:00+00:00");
        assert!(parse_datetime("yesterday").is_none());
    }

    #[test]
    fn offsetless_timestamp_is_read_as_utc() {
        let micros = parse_datetime("2024-01-05T10:00:00.123456").unwrap();
        assert_eq!(micros.to_rfc3339(), "2024-01-05T10:00:00.123456+00:00");

        let whole = parse_datetime("2024-01-05T10:00:00").unwrap();
        assert_eq!(whole.to_rfc3339(), "2024-01-05T10:00:00+00:00");
    }
}

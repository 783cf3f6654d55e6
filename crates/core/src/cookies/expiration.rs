use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::CookieRecord;

const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// The absolute expiration of a single record, if it has a usable one.
/// `expirationDate` wins over `expires`.
pub fn record_expiration(record: &CookieRecord) -> Option<DateTime<Utc>> {
    if let Some(seconds) = record.expiration_date {
        if seconds.is_finite() && seconds > 0.0 {
            return DateTime::from_timestamp_millis((seconds * 1000.0).round() as i64);
        }
    }

    record.expires.as_deref().and_then(parse_timestamp)
}

/// The earliest expiration across `records`, None when no record expires.
pub fn earliest_expiration(records: &[CookieRecord]) -> Option<DateTime<Utc>> {
    records.iter().filter_map(record_expiration).min()
}

/// Accepts RFC 3339, RFC 2822, HTTP-date and bare `YYYY-MM-DD` dates.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();

    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Some(date.with_timezone(&Utc));
    }

    if let Ok(date) = DateTime::parse_from_rfc2822(text) {
        return Some(date.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDateTime::parse_from_str(text, HTTP_DATE) {
        return Some(date.and_utc());
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|date| date.and_utc())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn record(expiration_date: Option<f64>, expires: Option<&str>) -> CookieRecord {
        CookieRecord {
            domain: "example.com".into(),
            name: "n".into(),
            value: "v".into(),
            path: "/".into(),
            secure: false,
            http_only: false,
            same_site: None,
            expiration_date,
            expires: expires.map(str::to_owned),
        }
    }

    #[test]
    fn session_cookies_have_no_expiration() {
        let records = vec![record(None, None), record(None, None)];
        assert_eq!(earliest_expiration(&records), None);
    }

    #[test]
    fn earliest_of_mixed_sources() {
        let records = vec![
            record(Some(1_900_000_000.0), None),
            record(None, None),
            record(None, Some("2030-01-01T00:00:00Z")),
            record(Some(1_800_000_000.0), None),
        ];

        assert_eq!(
            earliest_expiration(&records),
            Utc.timestamp_opt(1_800_000_000, 0).single()
        );
    }

    #[test]
    fn expires_string_used_when_epoch_missing() {
        let records = vec![
            record(None, Some("Fri, 31 Dec 9999 23:59:59 GMT")),
            record(None, Some("2027-03-01")),
        ];

        assert_eq!(
            earliest_expiration(&records),
            Utc.with_ymd_and_hms(2027, 3, 1, 0, 0, 0).single()
        );
    }

    #[test]
    fn zero_and_garbage_are_ignored() {
        let records = vec![record(Some(0.0), None), record(None, Some("tomorrow-ish"))];
        assert_eq!(earliest_expiration(&records), None);
    }

    #[test]
    fn fractional_seconds_are_kept() {
        let expiration = record_expiration(&record(Some(1_700_000_000.25), None)).unwrap();
        assert_eq!(expiration.timestamp_millis(), 1_700_000_000_250);
    }
}

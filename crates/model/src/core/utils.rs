use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};

/// Parses the timestamp layouts clients and databases emit. A bare date is
/// read as midnight.
pub fn parse_naive_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    parse_datetime_layouts(raw)
        .or_else(|| parse_date_layouts(raw).map(|d| d.and_time(NaiveTime::MIN)))
}

/// Parses a calendar date, accepting a full timestamp and truncating it.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    parse_date_layouts(raw).or_else(|| parse_datetime_layouts(raw).map(|dt| dt.date()))
}

/// Parses a timestamp that carries its own UTC offset, e.g. `...Z` or
/// `...+02:00`.
pub fn parse_offset_datetime(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw.trim()).ok()
}

fn parse_datetime_layouts(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M"))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.naive_utc())
                .ok()
        })
}

fn parse_date_layouts(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y/%m/%d"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_layouts() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        assert_eq!(parse_naive_datetime("2024-03-15 08:30:00"), Some(expected));
        assert_eq!(parse_naive_datetime("2024-03-15T08:30:00"), Some(expected));
        assert_eq!(parse_naive_datetime("2024-03-15T08:30:00Z"), Some(expected));
        assert_eq!(
            parse_naive_datetime("2024-03-15"),
            NaiveDate::from_ymd_opt(2024, 3, 15).map(|d| d.and_time(NaiveTime::MIN))
        );
        assert_eq!(parse_naive_datetime("yesterday"), None);
    }

    #[test]
    fn test_parse_offset_datetime() {
        let ts = parse_offset_datetime("2024-03-15T23:30:00+02:00").unwrap();
        assert_eq!(ts.offset().local_minus_utc(), 7200);
        assert!(parse_offset_datetime("2024-03-15 23:30:00").is_none());
    }

    #[test]
    fn test_parse_date_truncates() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 15);
        assert_eq!(parse_date("2024-03-15"), day);
        assert_eq!(parse_date("2024/03/15"), day);
        assert_eq!(parse_date("2024-03-15 23:59:59"), day);
        assert_eq!(parse_date("15.03.2024"), None);
    }
}

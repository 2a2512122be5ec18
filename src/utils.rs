use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime};

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// Parses the date formats the transaction store emits.
///
/// Returns `None` instead of failing; an unparsable date simply never falls
/// inside any period.
pub fn parse_transaction_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::MIN));
    }

    // Epoch milliseconds
    if raw.chars().all(|c| c.is_ascii_digit()) {
        return raw
            .parse::<i64>()
            .ok()
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| dt.naive_utc());
    }

    None
}

/// 00:00:00.000 of the given day.
pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// 23:59:59.999 of the given day.
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    let time = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    date.and_time(time)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// `part / whole * 100`, defined as 0 when `whole` is 0.
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    part / whole * 100.0
}

/// Percent change from `previous` to `current`, defined as 0 when `previous` is 0.
pub fn percent_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    (current - previous) / previous * 100.0
}

/// `total / count`, defined as 0 when `count` is 0.
pub fn safe_average(total: f64, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    total / count as f64
}

/// Calendar month label, e.g. "2024-03".
pub fn month_label(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Label of the month `offset` months after `start`.
pub fn month_label_after(start: NaiveDate, offset: u32) -> String {
    let first = start.with_day(1).unwrap_or(start);
    first
        .checked_add_months(Months::new(offset))
        .map(month_label)
        .unwrap_or_else(|| format!("Month {}", offset))
}

pub fn format_money(value: f64) -> String {
    if value < 0.0 {
        format!("-${:.2}", value.abs())
    } else {
        format!("${:.2}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_supported_formats() {
        let date_only = parse_transaction_datetime("2024-03-15").unwrap();
        assert_eq!(date_only.date(), NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(date_only.hour(), 0);

        let rfc = parse_transaction_datetime("2024-03-15T18:30:00+02:00").unwrap();
        assert_eq!(rfc.date(), NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(rfc.hour(), 18);

        let naive = parse_transaction_datetime("2024-03-15T08:05:09.250").unwrap();
        assert_eq!(naive.minute(), 5);

        let spaced = parse_transaction_datetime("2024-03-15 23:59:59").unwrap();
        assert_eq!(spaced.second(), 59);

        let millis = parse_transaction_datetime("1710460800000").unwrap();
        assert_eq!(millis.date(), NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
    }

    #[test]
    fn test_parse_garbage_is_none() {
        assert!(parse_transaction_datetime("").is_none());
        assert!(parse_transaction_datetime("not a date").is_none());
        assert!(parse_transaction_datetime("2024-13-45").is_none());
    }

    #[test]
    fn test_day_bounds() {
        let day = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(start_of_day(day).time(), NaiveTime::MIN);
        let end = end_of_day(day);
        assert_eq!(end.hour(), 23);
        assert_eq!(end.nanosecond(), 999_000_000);
    }

    #[test]
    fn test_division_guards() {
        assert_eq!(percentage(5.0, 0.0), 0.0);
        assert_eq!(percentage(25.0, 200.0), 12.5);
        assert_eq!(percent_change(150.0, 0.0), 0.0);
        assert_eq!(percent_change(150.0, 100.0), 50.0);
        assert_eq!(safe_average(10.0, 0), 0.0);
        assert_eq!(safe_average(10.0, 4), 2.5);
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round2(10.006), 10.01);
        assert_eq!(round2(-3.333), -3.33);
        assert_eq!(round1(79.96), 80.0);
    }

    #[test]
    fn test_month_labels() {
        let start = NaiveDate::from_ymd_opt(2024, 11, 30).unwrap();
        assert_eq!(month_label(start), "2024-11");
        assert_eq!(month_label_after(start, 1), "2024-12");
        assert_eq!(month_label_after(start, 3), "2025-02");
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(1234.5), "$1234.50");
        assert_eq!(format_money(-50.0), "-$50.00");
    }
}

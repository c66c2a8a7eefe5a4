use chrono::{DateTime, Duration, Local, NaiveDate};

/// `YYYYmmdd_HHMMSS`, used to name backup and report files.
pub fn timestamp_slug(now: DateTime<Local>) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}

// Parse a window string like "7d", "YYYY-MM-DD", or RFC3339 into a calendar date.
// Returns None if unparseable.
pub fn parse_since_date(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    if let Some(stripped) = s.strip_suffix('d') {
        if let Ok(days) = stripped.parse::<i64>() {
            if days > 0 { return today.checked_sub_signed(Duration::days(days)); }
        }
    }
    if let Ok(nd) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(nd);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    None
}

use std::sync::LazyLock;

use chrono::DateTime;
use regex::Regex;

use super::Region;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^<]+?>").expect("valid tag pattern"));

const ENTITIES: [(&str, &str); 6] = [
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&amp;", "&"),
    ("&quot;", "\""),
    ("&#39;", "'"),
];

/// Strip markup tags, decode the fixed entity set, trim.
pub fn sanitize(s: &str) -> String {
    if s.is_empty() { return String::new(); }
    let mut out = TAG_RE.replace_all(s, "").into_owned();
    for (entity, ch) in ENTITIES {
        if out.contains(entity) { out = out.replace(entity, ch); }
    }
    out.trim().to_string()
}

/// Eight digits `YYYYMMDD` -> `YYYY-MM-DD`, without calendar validation; anything else passes through unchanged.
pub fn normalize_date(s: &str) -> String {
    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        return format!("{}-{}-{}", &s[..4], &s[4..6], &s[6..]);
    }
    s.to_string()
}

/// Dates coming from the scrape backend: RFC3339, any `...T...` timestamp,
/// or the `Fri Nov 24 17:49:36 +0000 2023` form. Unknown shapes pass through.
pub fn normalize_stream_date(s: &str) -> String {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.date_naive().format("%Y-%m-%d").to_string();
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%a %b %d %H:%M:%S %z %Y") {
        return dt.date_naive().format("%Y-%m-%d").to_string();
    }
    if let Some((day, _)) = s.split_once('T') {
        return day.to_string();
    }
    s.to_string()
}

pub fn contains_hangul(s: &str) -> bool {
    s.chars().any(|c| matches!(c, 'ㄱ'..='ㅎ' | 'ㅏ'..='ㅣ' | '가'..='힣'))
}

/// Weak heuristic: any Hangul character means domestic.
pub fn classify_region(s: &str) -> Region {
    if s.trim().is_empty() { return Region::Unclassified; }
    if contains_hangul(s) { Region::Domestic } else { Region::Foreign }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_tags_and_decodes() {
        assert_eq!(sanitize("<b>A&amp;B</b>"), "A&B");
        assert_eq!(sanitize("  <b>러스트</b>&nbsp;&lt;tips&gt; &quot;q&quot; it&#39;s "), "러스트 <tips> \"q\" it's");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn sanitize_is_idempotent_on_clean_text() {
        for s in ["A&B", "plain text", "조회 1,234", "x < y"] {
            assert_eq!(sanitize(&sanitize(s)), sanitize(s));
            assert_eq!(sanitize(s), s);
        }
    }

    #[test]
    fn normalize_date_forms() {
        assert_eq!(normalize_date("20241223"), "2024-12-23");
        assert_eq!(normalize_date("2024-12-23"), "2024-12-23");
        assert_eq!(normalize_date(&normalize_date("20241223")), "2024-12-23");
        assert_eq!(normalize_date("2024122"), "2024122");
        assert_eq!(normalize_date("2024ab23"), "2024ab23");
        assert_eq!(normalize_date("20241399"), "2024-13-99");
        assert_eq!(normalize_date(""), "");
    }

    #[test]
    fn normalize_stream_date_forms() {
        assert_eq!(normalize_stream_date("2024-12-23T10:30:00+00:00"), "2024-12-23");
        assert_eq!(normalize_stream_date("2024-12-23T10:30:00"), "2024-12-23");
        assert_eq!(normalize_stream_date("Fri Nov 24 17:49:36 +0000 2023"), "2023-11-24");
        assert_eq!(normalize_stream_date("Tue Nov 28 08:00:00 +0000 2023"), "2023-11-28");
        assert_eq!(normalize_stream_date("yesterday"), "yesterday");
    }

    #[test]
    fn region_heuristic() {
        assert_eq!(classify_region("오늘 날씨 좋다"), Region::Domestic);
        assert_eq!(classify_region("mixed text with ㅋㅋ"), Region::Domestic);
        assert_eq!(classify_region("hello world"), Region::Foreign);
        assert_eq!(classify_region("   "), Region::Unclassified);
    }
}

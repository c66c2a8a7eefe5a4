use std::collections::BTreeMap;

use crate::record::{NormalizedRecord, Platform, Region};

use super::types::{DailyCount, KeywordSummary, PlatformTotals, RegionSplit};

fn add_to(row: &mut KeywordSummary, r: &NormalizedRecord) {
    row.total += 1;
    match r.platform {
        Platform::BlogSource => row.blog += 1,
        Platform::StreamSource => row.stream += 1,
    }
    row.views += r.views.unwrap_or(0);
    row.likes += r.likes.unwrap_or(0);
    row.comments += r.comments.unwrap_or(0);
    row.reposts += r.reposts.unwrap_or(0);
    if r.views.is_some_and(|v| v > 0) { row.with_views += 1; }
}

/// One row per keyword present in `records`, sorted by keyword.
pub fn by_keyword(records: &[NormalizedRecord]) -> Vec<KeywordSummary> {
    let mut groups: BTreeMap<&str, KeywordSummary> = BTreeMap::new();
    for r in records {
        let row = groups.entry(r.keyword.as_str()).or_insert_with(|| KeywordSummary { keyword: r.keyword.clone(), ..KeywordSummary::default() });
        add_to(row, r);
    }
    groups.into_values().collect()
}

/// `by_keyword` rows in the caller's keyword order, zero rows included.
pub fn keyword_table(records: &[NormalizedRecord], keywords: &[String]) -> Vec<KeywordSummary> {
    let grouped: BTreeMap<String, KeywordSummary> = by_keyword(records).into_iter().map(|row| (row.keyword.clone(), row)).collect();
    keywords.iter().map(|kw| {
        grouped.get(kw).cloned().unwrap_or_else(|| KeywordSummary { keyword: kw.clone(), ..KeywordSummary::default() })
    }).collect()
}

/// Counts per (date, platform, keyword, region); newest date first, the rest ascending.
pub fn by_day(records: &[NormalizedRecord]) -> Vec<DailyCount> {
    let mut groups: BTreeMap<(&str, Platform, &str, Region), usize> = BTreeMap::new();
    for r in records {
        *groups.entry((r.posted_at.as_str(), r.platform, r.keyword.as_str(), r.region)).or_default() += 1;
    }
    let mut rows: Vec<DailyCount> = groups.into_iter()
        .map(|((date, platform, keyword, region), count)| DailyCount { date: date.to_string(), platform, keyword: keyword.to_string(), region, count })
        .collect();
    rows.sort_by(|a, b| b.date.cmp(&a.date));
    rows
}

pub fn region_split(records: &[NormalizedRecord]) -> RegionSplit {
    let mut split = RegionSplit::default();
    for r in records {
        match r.platform {
            Platform::BlogSource => split.blog.add(r.region),
            Platform::StreamSource => split.stream.add(r.region),
        }
        split.total.add(r.region);
    }
    split
}

pub fn platform_totals(records: &[NormalizedRecord]) -> Vec<PlatformTotals> {
    [Platform::BlogSource, Platform::StreamSource].into_iter().map(|platform| {
        let of: Vec<&NormalizedRecord> = records.iter().filter(|r| r.platform == platform).collect();
        PlatformTotals { platform, records: of.len(), detail_success: of.iter().filter(|r| r.detail_status.is_success()).count() }
    }).collect()
}


#[cfg(test)]
mod tests {
    use super::*;

    fn counts(rows: &[KeywordSummary]) -> Vec<(&str, usize, usize, usize)> {
        rows.iter().map(|r| (r.keyword.as_str(), r.total, r.blog, r.stream)).collect()
    }

    #[test]
    fn golden_by_keyword() {
        let rows = by_keyword(&golden::records());
        assert_eq!(counts(&rows), vec![("rust", 5, 3, 2), ("serde", 1, 0, 1), ("tokio", 1, 1, 0)]);
        let rust = &rows[0];
        assert_eq!((rust.views, rust.likes, rust.comments, rust.reposts), (1150, 56, 8, 8));
        assert_eq!(rust.with_views, 3);
        assert_eq!(rows[2].views, 0);
    }

    #[test]
    fn keyword_table_keeps_caller_order_and_zero_rows() {
        let kws = vec!["tokio".to_string(), "axum".into(), "rust".into()];
        let rows = keyword_table(&golden::records(), &kws);
        assert_eq!(counts(&rows), vec![("tokio", 1, 1, 0), ("axum", 0, 0, 0), ("rust", 5, 3, 2)]);
    }

    #[test]
    fn keyword_table_reuses_grouped_rows() {
        let recs = golden::records();
        let grouped = by_keyword(&recs);
        let kws: Vec<String> = grouped.iter().rev().map(|r| r.keyword.clone()).collect();
        let mut table = keyword_table(&recs, &kws);
        table.reverse();
        assert_eq!(table, grouped);
    }

    #[test]
    fn daily_groups_sorted_newest_first() {
        let rows = by_day(&golden::records());
        let keys: Vec<(&str, Platform, &str, Region, usize)> = rows.iter().map(|d| (d.date.as_str(), d.platform, d.keyword.as_str(), d.region, d.count)).collect();
        assert_eq!(keys, vec![
            ("2024-12-23", Platform::BlogSource, "rust", Region::Domestic, 2),
            ("2024-12-23", Platform::StreamSource, "rust", Region::Domestic, 1),
            ("2024-12-23", Platform::StreamSource, "rust", Region::Foreign, 1),
            ("2024-12-22", Platform::BlogSource, "rust", Region::Domestic, 1),
            ("2024-12-21", Platform::BlogSource, "tokio", Region::Domestic, 1),
            ("2024-12-20", Platform::StreamSource, "serde", Region::Unclassified, 1),
        ]);
    }

    #[test]
    fn regions_and_platforms() {
        let recs = golden::records();
        let split = region_split(&recs);
        assert_eq!((split.blog.domestic, split.blog.foreign), (4, 0));
        assert_eq!((split.stream.domestic, split.stream.foreign, split.stream.unclassified), (1, 1, 1));
        assert_eq!(split.total.total(), recs.len());

        let totals = platform_totals(&recs);
        assert_eq!(totals[0], PlatformTotals { platform: Platform::BlogSource, records: 4, detail_success: 2 });
        assert_eq!(totals[1], PlatformTotals { platform: Platform::StreamSource, records: 3, detail_success: 0 });
    }

    #[test]
    fn aggregation_is_pure() {
        let recs = golden::records();
        let before = recs.clone();
        assert_eq!(by_keyword(&recs), by_keyword(&recs));
        assert_eq!(by_day(&recs), by_day(&recs));
        assert_eq!(recs, before);
    }
}

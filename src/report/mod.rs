pub mod aggregate;
pub mod sheets;
pub mod types;
pub mod writer;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Result};
use chrono::{Local, NaiveDate};
use clap::Args;
use serde::Serialize;

use crate::backup;
use crate::collect::parse_keywords;
use crate::config::AppConfig;
use crate::record::{NormalizedRecord, Region};
use crate::telemetry::{self};
use crate::telemetry::ops::report::Phase as ReportPhase;
use crate::util::time::parse_since_date;

use writer::{JsonReportWriter, ReportGenerator};

#[derive(Args, Debug)]
pub struct ReportCmd {
    /// Backup files to merge
    #[arg(required = true)] pub inputs: Vec<PathBuf>,
    #[arg(long = "keyword", short = 'k', value_delimiter = ',')] pub keywords: Vec<String>, // keyword order for the tables; default: order of first appearance
    #[arg(long)] pub since: Option<String>, // keep posts on/after this date (e.g., "7d" or "2025-01-01")
    #[arg(long)] pub output_dir: Option<PathBuf>,
}

#[derive(Serialize)]
struct ReportOut {
    path: PathBuf,
    records: usize,
    keywords: Vec<String>,
    dropped_by_since: usize,
}

fn keywords_in_order(records: &[NormalizedRecord]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for r in records {
        if !out.contains(&r.keyword) { out.push(r.keyword.clone()); }
    }
    out
}

/// Posts whose date cannot be read are kept.
fn posted_on_or_after(r: &NormalizedRecord, since: NaiveDate) -> bool {
    match NaiveDate::parse_from_str(&r.posted_at, "%Y-%m-%d") {
        Ok(d) => d >= since,
        Err(_) => true,
    }
}

pub async fn run(cfg: &AppConfig, args: ReportCmd) -> Result<()> {
    let started = Instant::now();
    let log = telemetry::report();
    let _g = log.root_span_kv([
        ("inputs", args.inputs.len().to_string()),
        ("since", format!("{:?}", args.since)),
    ]).entered();

    let mut records: Vec<NormalizedRecord> = Vec::new();
    {
        let _s = log.span(&ReportPhase::Load).entered();
        for p in &args.inputs { records.extend(backup::read(p)?); }
    }

    let mut dropped = 0usize;
    if let Some(s) = &args.since {
        let Some(since) = parse_since_date(s, Local::now().date_naive()) else { bail!("invalid --since value: {s}"); };
        let before = records.len();
        records.retain(|r| posted_on_or_after(r, since));
        dropped = before - records.len();
    }

    let keywords = if args.keywords.is_empty() { keywords_in_order(&records) } else { parse_keywords(&args.keywords) };

    {
        let _s = log.span(&ReportPhase::Aggregate).entered();
        let split = aggregate::region_split(&records);
        log.summary(records.len(), keywords.len(), split.total.domestic, split.total.foreign);
        for row in aggregate::keyword_table(&records, &keywords) {
            log.info(format!("   {} — total={} blog={} stream={} views={}", row.keyword, row.total, row.blog, row.stream, row.views));
        }
        if split.total.unclassified > 0 { log.info(format!("   {} post(s) {}", split.total.unclassified, Region::Unclassified.label())); }
    }

    let path = {
        let _s = log.span(&ReportPhase::WriteReport).entered();
        let dir = args.output_dir.clone().unwrap_or_else(|| cfg.output_dir.clone());
        JsonReportWriter::new(dir).generate(&records, &keywords)?
    };
    log.info(format!("📁 Report written to {}", path.display()));

    if telemetry::config::json_mode() {
        log.result(&ReportOut { path, records: records.len(), keywords, dropped_by_since: dropped }, started.elapsed().as_millis())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::fixtures::record;
    use crate::record::Platform;

    #[test]
    fn keyword_order_follows_first_appearance() {
        let recs = vec![
            record(Platform::BlogSource, "tokio", "u1", "2024-12-23"),
            record(Platform::StreamSource, "rust", "u2", "2024-12-23"),
            record(Platform::BlogSource, "tokio", "u3", "2024-12-23"),
        ];
        assert_eq!(keywords_in_order(&recs), vec!["tokio".to_string(), "rust".to_string()]);
    }

    #[test]
    fn since_filter_keeps_unreadable_dates() {
        let since = NaiveDate::from_ymd_opt(2024, 12, 22).unwrap();
        assert!(posted_on_or_after(&record(Platform::BlogSource, "k", "u", "2024-12-23"), since));
        assert!(posted_on_or_after(&record(Platform::BlogSource, "k", "u", "2024-12-22"), since));
        assert!(!posted_on_or_after(&record(Platform::BlogSource, "k", "u", "2024-12-01"), since));
        assert!(posted_on_or_after(&record(Platform::StreamSource, "k", "u", "Fri Nov 24"), since));
    }
}

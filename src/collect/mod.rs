pub mod apify;
pub mod blog_api;
pub mod error;
pub mod stream;
pub mod types;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use async_trait::async_trait;
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::backup;
use crate::config::AppConfig;
use crate::detail::{self, DetailOpts};
use crate::pacing::{Pacer, SystemClock};
use crate::record::{NormalizedRecord, Platform};
use crate::report::writer::{JsonReportWriter, ReportGenerator};
use crate::telemetry::{self};
use crate::telemetry::ops::collect::Phase as CollectPhase;

use apify::ApifyTweetBackend;
use blog_api::{BlogApiCollector, NaverSearchClient};
use stream::StreamCollector;
use types::{CollectPlan, CollectRunResult, DetailSummary};

/// Spacing between search API requests.
pub const API_DELAY: Duration = Duration::from_millis(150);

/// One upstream source. Collection is best-effort: failures end in a partial (possibly empty) list.
#[async_trait]
pub trait Collector: Send + Sync {
    fn platform(&self) -> Platform;
    async fn collect(&self, keyword: &str, max_results: usize, cancel: &CancellationToken) -> Vec<NormalizedRecord>;
}

/// Keywords run one after another; each keyword's outcome is independent of the others.
pub async fn collect_keywords(collector: &dyn Collector, keywords: &[String], max_results: usize, cancel: &CancellationToken) -> Vec<NormalizedRecord> {
    let log = telemetry::collect();
    let mut out = Vec::new();
    for kw in keywords {
        if cancel.is_cancelled() { break; }
        let span = log.span_kv(&CollectPhase::Keyword, [("platform", collector.platform().label().to_string()), ("keyword", kw.clone())]);
        out.extend(collector.collect(kw, max_results, cancel).instrument(span).await);
    }
    out
}

/// Trim, drop blanks, dedupe keeping first occurrence.
pub fn parse_keywords(raw: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for kw in raw.iter().map(|k| k.trim()).filter(|k| !k.is_empty()) {
        if !out.iter().any(|k| k == kw) { out.push(kw.to_string()); }
    }
    out
}

#[derive(Args, Debug)]
pub struct CollectCmd {
    #[arg(long = "keyword", short = 'k', value_delimiter = ',', required = true)] pub keywords: Vec<String>,
    #[arg(long, default_value_t = false)] pub apply: bool, // default is plan-only; use --apply to execute
    #[arg(long, default_value_t = 100)] pub max_blog: usize,
    #[arg(long, default_value_t = 100)] pub max_stream: usize,
    #[arg(long, default_value_t = false)] pub skip_blog: bool,
    #[arg(long, default_value_t = false)] pub skip_stream: bool,
    #[arg(long, default_value_t = false)] pub detail: bool, // run the detail batch over collected blog posts
    #[arg(long, default_value_t = false)] pub report: bool, // write the report after collecting
    #[arg(long)] pub data_dir: Option<PathBuf>,
    #[arg(long)] pub output_dir: Option<PathBuf>,
    #[command(flatten)] pub detail_opts: DetailOpts,
}

pub async fn run(cfg: &AppConfig, args: CollectCmd, cancel: CancellationToken) -> Result<()> {
    let started = Instant::now();
    let keywords = parse_keywords(&args.keywords);
    if keywords.is_empty() { bail!("at least one non-empty --keyword is required"); }

    let blog = !args.skip_blog;
    if blog && (cfg.search.client_id.is_none() || cfg.search.client_secret.is_none()) {
        bail!("NAVER_CLIENT_ID and NAVER_CLIENT_SECRET must be set (or pass --skip-blog)");
    }
    let stream = !args.skip_stream && cfg.apify_token.is_some();
    let data_dir = args.data_dir.clone().unwrap_or_else(|| cfg.data_dir.clone());

    let log = telemetry::collect();
    let _g = log.root_span_kv([
        ("keywords", keywords.join(",")),
        ("apply", args.apply.to_string()),
        ("detail", args.detail.to_string()),
    ]).entered();
    if !args.skip_stream && !stream { log.warn("APIFY_TOKEN is not set; skipping stream collection"); }

    if !args.apply {
        log.info(format!(
            "📝 Collect plan — keywords={} blog={} (max {}) stream={} (max {}) detail={} report={}",
            keywords.join(","), blog, args.max_blog, stream, args.max_stream, args.detail, args.report
        ));
        if args.detail { log.info(format!("   Detail phase will take roughly {} min for a full blog run", (keywords.len() * args.max_blog * 4).div_ceil(60))); }
        log.info("   Use --apply to execute.");
        if telemetry::config::json_mode() {
            log.plan(&CollectPlan {
                keywords, blog, stream,
                max_blog: args.max_blog, max_stream: args.max_stream,
                detail: args.detail, report: args.report, data_dir,
            })?;
        }
        return Ok(());
    }

    let mut result = CollectRunResult { keywords: keywords.clone(), ..CollectRunResult::default() };

    let mut blog_records = Vec::new();
    if blog {
        let client = NaverSearchClient::new(&cfg.search)?;
        let collector = BlogApiCollector::new(client, Pacer::new(API_DELAY, Arc::new(SystemClock)));
        blog_records = collect_keywords(&collector, &keywords, args.max_blog, &cancel).await;
        log.info(format!("📊 Blog collection done — {} urls", blog_records.len()));
    }

    if args.detail && !blog_records.is_empty() && !cancel.is_cancelled() {
        let span = log.span(&CollectPhase::Detail);
        let mut summary = DetailSummary::default();
        match detail::run_batch(cfg, &args.detail_opts, blog_records.clone(), &cancel).instrument(span).await {
            Ok(outcome) => {
                summary.attempted = outcome.attempted;
                summary.success = outcome.success;
                summary.failed = outcome.failed;
                blog_records = outcome.records;
            }
            Err(e) => {
                log.warn_kv("❌ detail batch aborted; keeping collected records", [("error", format!("{e:#}"))]);
                summary.error = Some(format!("{e:#}"));
            }
        }
        result.detail = Some(summary);
    }

    let mut stream_records = Vec::new();
    if let (true, Some(token)) = (stream, cfg.apify_token.clone()) {
        let collector = StreamCollector::new(ApifyTweetBackend::new(token, cfg.http_timeout)?);
        stream_records = collect_keywords(&collector, &keywords, args.max_stream, &cancel).await;
    }
    log.totals(blog_records.len(), stream_records.len());

    {
        let _s = log.span(&CollectPhase::WriteBackup).entered();
        if blog { result.backups.push(backup::write(&data_dir, Platform::BlogSource, &blog_records)?); }
        if stream { result.backups.push(backup::write(&data_dir, Platform::StreamSource, &stream_records)?); }
    }
    for p in &result.backups { log.info(format!("💾 Saved {}", p.display())); }

    result.blog_records = blog_records.len();
    result.stream_records = stream_records.len();
    result.cancelled = cancel.is_cancelled();

    if args.report {
        let _s = log.span(&CollectPhase::WriteReport).entered();
        let out_dir = args.output_dir.clone().unwrap_or_else(|| cfg.output_dir.clone());
        let mut all = blog_records;
        all.extend(stream_records);
        let path = JsonReportWriter::new(out_dir).generate(&all, &keywords)?;
        log.info(format!("📁 Report written to {}", path.display()));
        result.report = Some(path);
    }

    if telemetry::config::json_mode() {
        log.result(&result, started.elapsed().as_millis())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::fixtures::record;
    use std::sync::Mutex;

    struct Scripted {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Collector for Scripted {
        fn platform(&self) -> Platform { Platform::BlogSource }
        async fn collect(&self, keyword: &str, _max: usize, _cancel: &CancellationToken) -> Vec<NormalizedRecord> {
            self.seen.lock().unwrap().push(keyword.to_string());
            if keyword == "broken" { return Vec::new(); }
            vec![record(Platform::BlogSource, keyword, &format!("https://blog.example.com/{keyword}/1"), "2024-12-23")]
        }
    }

    #[test]
    fn keywords_are_trimmed_and_deduped() {
        let raw = vec![" rust".to_string(), "tokio".into(), "".into(), "rust".into(), "  ".into()];
        assert_eq!(parse_keywords(&raw), vec!["rust".to_string(), "tokio".to_string()]);
    }

    #[tokio::test]
    async fn failed_keyword_does_not_block_the_next() {
        let c = Scripted { seen: Mutex::new(Vec::new()) };
        let kws = vec!["rust".to_string(), "broken".into(), "tokio".into()];
        let out = collect_keywords(&c, &kws, 10, &CancellationToken::new()).await;
        assert_eq!(*c.seen.lock().unwrap(), kws);
        let got: Vec<&str> = out.iter().map(|r| r.keyword.as_str()).collect();
        assert_eq!(got, vec!["rust", "tokio"]);
    }

    #[tokio::test]
    async fn cancelled_run_collects_nothing_more() {
        let c = Scripted { seen: Mutex::new(Vec::new()) };
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(collect_keywords(&c, &["rust".to_string()], 10, &cancel).await.is_empty());
        assert!(c.seen.lock().unwrap().is_empty());
    }
}

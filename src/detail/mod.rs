pub mod batch;
pub mod chrome;
pub mod extractor;
pub mod session;
pub mod snapshot;
pub mod strategy;
pub mod types;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::backup;
use crate::config::AppConfig;
use crate::pacing::{Pacer, SystemClock};
use crate::record::{NormalizedRecord, Platform};
use crate::telemetry::{self};
use crate::telemetry::ops::detail::Phase as DetailPhase;

use batch::{BatchOrchestrator, BatchOutcome};
use chrome::ChromeSessionFactory;
use extractor::DetailExtractor;
use session::SessionFactory;
use snapshot::SnapshotSessionFactory;
use types::{DetailPlan, DetailRunResult};

#[derive(clap::ValueEnum, Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Engine {
    #[value(name = "chrome")] Chrome,
    #[value(name = "snapshot")] Snapshot,
}

/// Detail-phase knobs shared by `collect --detail` and `detail`.
#[derive(Args, Debug, Clone)]
pub struct DetailOpts {
    #[arg(long, value_enum, default_value_t = Engine::Chrome)] pub engine: Engine,
    #[arg(long, default_value_t = 2000)] pub delay_ms: u64, // pause between posts
    #[arg(long, default_value_t = false)] pub headful: bool, // show the browser window
}

#[derive(Args, Debug)]
pub struct DetailCmd {
    /// Blog backup file produced by `collect`
    pub input: PathBuf,
    #[arg(long, default_value_t = false)] pub apply: bool, // default is plan-only; use --apply to execute
    #[arg(long)] pub data_dir: Option<PathBuf>,
    #[command(flatten)] pub opts: DetailOpts,
}

pub fn open_factory(cfg: &AppConfig, opts: &DetailOpts) -> Result<Box<dyn SessionFactory>> {
    Ok(match opts.engine {
        Engine::Chrome => Box::new(ChromeSessionFactory::new(cfg.user_agent.clone(), !opts.headful, cfg.http_timeout * 3)),
        Engine::Snapshot => Box::new(SnapshotSessionFactory::http(&cfg.user_agent, cfg.http_timeout)?),
    })
}

/// Runs the batch over `records` with the system clock. Session launch failure is the only error.
pub async fn run_batch(cfg: &AppConfig, opts: &DetailOpts, records: Vec<NormalizedRecord>, cancel: &CancellationToken) -> Result<BatchOutcome> {
    let factory = open_factory(cfg, opts)?;
    let clock = Arc::new(SystemClock);
    let orchestrator = BatchOrchestrator::new(factory.as_ref(), DetailExtractor::new(clock.clone()), Pacer::new(Duration::from_millis(opts.delay_ms), clock));
    let outcome = orchestrator.run(records, cancel).await.context("detail batch could not start")?;
    Ok(outcome)
}

/// The detail phase and its backup only cover blog posts; returns them and how many others were dropped.
fn blog_records(records: Vec<NormalizedRecord>) -> (Vec<NormalizedRecord>, usize) {
    let total = records.len();
    let blog: Vec<NormalizedRecord> = records.into_iter().filter(|r| r.platform == Platform::BlogSource).collect();
    let ignored = total - blog.len();
    (blog, ignored)
}

pub async fn run(cfg: &AppConfig, args: DetailCmd, cancel: CancellationToken) -> Result<()> {
    let started = Instant::now();
    let log = telemetry::detail();
    let _g = log.root_span_kv([
        ("input", args.input.display().to_string()),
        ("engine", format!("{:?}", args.opts.engine)),
        ("apply", args.apply.to_string()),
    ]).entered();

    let (records, ignored) = blog_records(backup::read(&args.input)?);
    if ignored > 0 { log.warn(format!("ignoring {ignored} non-blog record(s) in {}", args.input.display())); }
    let eligible = records.iter().filter(|r| r.needs_detail()).count();

    if !args.apply {
        let _p = log.span(&DetailPhase::Plan).entered();
        log.info(format!("📝 Detail plan — records={} eligible={} engine={:?} delay={}ms", records.len(), eligible, args.opts.engine, args.opts.delay_ms));
        log.info("   Use --apply to execute.");
        if telemetry::config::json_mode() {
            log.plan(&DetailPlan { input: args.input.clone(), records: records.len(), ignored, eligible, engine: args.opts.engine, delay_ms: args.opts.delay_ms })?;
        }
        return Ok(());
    }

    let outcome = run_batch(cfg, &args.opts, records, &cancel).await?;

    let dir = args.data_dir.clone().unwrap_or_else(|| cfg.data_dir.clone());
    let path = {
        let _s = log.span(&DetailPhase::WriteBackup).entered();
        backup::write(&dir, Platform::BlogSource, &outcome.records)?
    };
    log.info(format!("💾 Saved {} records to {}", outcome.records.len(), path.display()));

    if telemetry::config::json_mode() {
        let res = DetailRunResult {
            input: args.input,
            backup: path,
            attempted: outcome.attempted,
            success: outcome.success,
            failed: outcome.failed,
            skipped: outcome.skipped,
            cancelled: outcome.cancelled,
        };
        log.result(&res, started.elapsed().as_millis())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::fixtures::record;

    #[test]
    fn mixed_backup_keeps_only_blog_posts() {
        let recs = vec![
            record(Platform::BlogSource, "rust", "https://blog.example.com/a/1", "2024-12-23"),
            record(Platform::StreamSource, "rust", "https://x.com/a/status/1", "2024-12-23"),
            record(Platform::BlogSource, "tokio", "https://blog.example.com/b/1", "2024-12-21"),
        ];
        let (blog, ignored) = blog_records(recs);
        assert_eq!(ignored, 1);
        assert_eq!(blog.len(), 2);
        assert!(blog.iter().all(|r| r.platform == Platform::BlogSource));
    }
}

use std::marker::PhantomData;

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info, warn, Span};

use crate::output::config::OutputConfig;
use crate::output::types::{Envelope, Meta};
use crate::output::Emitter;
use crate::record::{DetailResult, Platform};

use super::ops::collect::Collect;
use super::ops::detail::Detail;
use super::ops::report::Report;

pub trait PhaseSpan {
    fn name(&self) -> &'static str;
    fn span(&self) -> Span;
}

pub trait OpMarker {
    const NAME: &'static str;
    type Phase: PhaseSpan;
    fn root_span() -> Span;
}

pub struct LogCtx<O: OpMarker> {
    pub(crate) json: bool,
    pub(crate) _marker: PhantomData<O>,
}

impl<O: OpMarker> LogCtx<O> {
    fn op_name(&self) -> &'static str { O::NAME }

    pub fn root_span_kv<'a, T>(&self, fields: T) -> Span
    where
        T: IntoIterator<Item = (&'a str, String)>,
    {
        let span = O::root_span();
        let details = kv_to_string(fields);
        if details.is_empty() {
            info!(op = %self.op_name(), "start");
        } else {
            info!(op = %self.op_name(), details = %details, "start");
        }
        span
    }

    pub fn span(&self, ph: &O::Phase) -> Span { ph.span() }

    pub fn span_kv<'a, T>(&self, ph: &O::Phase, fields: T) -> Span
    where
        T: IntoIterator<Item = (&'a str, String)>,
    {
        let span = self.span(ph);
        let details = kv_to_string(fields);
        debug!(op = %self.op_name(), phase = ph.name(), details = %details, "span_start");
        span
    }

    pub fn info(&self, msg: impl AsRef<str>) { if self.json { info!(op = %self.op_name(), "{}", msg.as_ref()); } else { info!("{}", msg.as_ref()); } }
    pub fn debug(&self, msg: impl AsRef<str>) { if self.json { debug!(op = %self.op_name(), "{}", msg.as_ref()); } else { debug!("{}", msg.as_ref()); } }
    pub fn warn(&self, msg: impl AsRef<str>) { if self.json { warn!(op = %self.op_name(), "{}", msg.as_ref()); } else { warn!("{}", msg.as_ref()); } }

    pub fn warn_kv<'a, D>(&self, msg: &str, kv: D)
    where
        D: IntoIterator<Item = (&'a str, String)>,
    {
        if self.json { let details = kv_to_string(kv); warn!(op = %self.op_name(), details = %details, "{}", msg); }
        else { warn!("{} {}", msg, kv_to_string(kv)); }
    }

    pub fn plan<T: Serialize>(&self, plan: &T) -> Result<()> {
        let env = Envelope::plan(self.op_name(), plan, None)?;
        Emitter::new(OutputConfig::from_env()).emit(&env)?;
        Ok(())
    }

    pub fn result<T: Serialize>(&self, result: &T, duration_ms: u128) -> Result<()> {
        let env = Envelope::result(self.op_name(), result, Some(Meta { duration_ms: Some(duration_ms) }))?;
        Emitter::new(OutputConfig::from_env()).emit(&env)?;
        Ok(())
    }
}

impl LogCtx<Collect> {
    pub fn keyword_summary(&self, platform: Platform, keyword: &str, count: usize) {
        if self.json { info!(op = %self.op_name(), platform = platform.label(), keyword, count, "keyword_summary"); }
        else { info!("✅ {} '{}' — collected={}", platform.label(), keyword, count); }
    }

    pub fn region_split(&self, keyword: &str, domestic: usize, foreign: usize, unclassified: usize) {
        if self.json { info!(op = %self.op_name(), keyword, domestic, foreign, unclassified, "region_split"); }
        else { info!("   └ domestic={} foreign={} unclassified={}", domestic, foreign, unclassified); }
    }

    pub fn totals(&self, blog: usize, stream: usize) {
        if self.json { info!(op = %self.op_name(), blog, stream, "collect_totals"); }
        else { info!("📊 Collect totals — blog={} stream={} all={}", blog, stream, blog + stream); }
    }
}

impl LogCtx<Detail> {
    pub fn item(&self, idx: usize, total: usize, url: &str, res: &DetailResult) {
        match res.error() {
            None if self.json => info!(op = %self.op_name(), idx, total, url, views = res.views, comments = res.comments, likes = res.likes, "item_ok"),
            None => info!("[{}/{}] ✅ views={} comments={} likes={}", idx, total, res.views, res.comments, res.likes),
            Some(err) if self.json => warn!(op = %self.op_name(), idx, total, url, error = err, "item_failed"),
            Some(err) => warn!("[{}/{}] ⚠️  detail failed for {}: {}", idx, total, url, err),
        }
    }

    pub fn progress(&self, done: usize, total: usize, success: usize) {
        let pct = if total == 0 { 100.0 } else { done as f64 * 100.0 / total as f64 };
        if self.json { info!(op = %self.op_name(), done, total, success, pct, "progress"); }
        else { info!("📈 progress {:.1}% ({}/{}) — success {}/{}", pct, done, total, success, done); }
    }

    pub fn totals(&self, total: usize, success: usize, failed: usize, skipped: usize) {
        if self.json { info!(op = %self.op_name(), total, success, failed, skipped, "detail_totals"); }
        else { info!("📊 Detail totals — total={} success={} failed={} skipped={}", total, success, failed, skipped); }
    }
}

impl LogCtx<Report> {
    pub fn summary(&self, records: usize, keywords: usize, domestic: usize, foreign: usize) {
        if self.json { info!(op = %self.op_name(), records, keywords, domestic, foreign, "report_summary"); }
        else { info!("📊 Report — records={} keywords={} domestic={} foreign={}", records, keywords, domestic, foreign); }
    }
}

fn kv_to_string<'a, T>(kv: T) -> String
where
    T: IntoIterator<Item = (&'a str, String)>,
{
    let mut parts: Vec<String> = Vec::new();
    for (k, v) in kv { parts.push(format!("{}={}", k, v)); }
    parts.join(" ")
}

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::pacing::Pacer;
use crate::record::NormalizedRecord;
use crate::telemetry;
use crate::telemetry::ops::detail::Phase as DetailPhase;

use super::extractor::DetailExtractor;
use super::session::{SessionError, SessionFactory};

pub const PROGRESS_EVERY: usize = 10;

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    #[serde(skip)]
    pub records: Vec<NormalizedRecord>,
    pub attempted: usize,
    pub success: usize,
    pub failed: usize,
    /// Records not eligible for detail, plus those left untouched by cancellation.
    pub skipped: usize,
    pub cancelled: bool,
}

/// Sequential detail extraction over one session, paced between records.
pub struct BatchOrchestrator<'f> {
    factory: &'f dyn SessionFactory,
    extractor: DetailExtractor,
    pacer: Pacer,
}

impl<'f> BatchOrchestrator<'f> {
    pub fn new(factory: &'f dyn SessionFactory, extractor: DetailExtractor, pacer: Pacer) -> Self {
        BatchOrchestrator { factory, extractor, pacer }
    }

    /// Only a session that cannot be opened fails the batch; per-record failures land on the record.
    pub async fn run(&self, records: Vec<NormalizedRecord>, cancel: &CancellationToken) -> Result<BatchOutcome, SessionError> {
        let log = telemetry::detail();
        let total = records.iter().filter(|r| r.needs_detail()).count();
        let mut out = BatchOutcome { records: Vec::with_capacity(records.len()), ..BatchOutcome::default() };
        if total == 0 {
            out.skipped = records.len();
            out.records = records;
            log.totals(0, 0, 0, out.skipped);
            return Ok(out);
        }

        let mut session = self.factory.open().instrument(log.span(&DetailPhase::AcquireSession)).await?;

        let mut done = 0usize;
        for rec in records {
            if !rec.needs_detail() { out.skipped += 1; out.records.push(rec); continue; }
            if cancel.is_cancelled() {
                if !out.cancelled { log.warn_kv("⏹ cancelled; remaining records left as not attempted", [("done", done.to_string()), ("total", total.to_string())]); }
                out.cancelled = true;
                out.skipped += 1;
                out.records.push(rec);
                continue;
            }

            self.pacer.wait().await;
            let span = log.span_kv(&DetailPhase::Extract, [("url", rec.source_url.clone())]);
            let res = self.extractor.extract(session.as_mut(), &rec.source_url).instrument(span).await;
            self.pacer.stamp();

            done += 1;
            log.item(done, total, &rec.source_url, &res);
            if res.status.is_success() { out.success += 1; } else { out.failed += 1; }
            out.records.push(rec.with_detail(res));
            if done % PROGRESS_EVERY == 0 || done == total { log.progress(done, total, out.success); }
        }
        out.attempted = done;

        if let Err(e) = session.close().await {
            log.warn_kv("session close failed", [("error", e.to_string())]);
        }
        log.totals(total, out.success, out.failed, out.skipped);
        Ok(out)
    }
}

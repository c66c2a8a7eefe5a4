use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Collect;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Keyword, FetchPage, Scrape, Detail, WriteBackup, WriteReport }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Keyword => "keyword",
        Phase::FetchPage => "fetch_page",
        Phase::Scrape => "scrape",
        Phase::Detail => "detail",
        Phase::WriteBackup => "write_backup",
        Phase::WriteReport => "write_report",
    }}
    fn span(&self) -> Span { match self {
        Phase::Keyword => info_span!("keyword"),
        Phase::FetchPage => info_span!("fetch_page"),
        Phase::Scrape => info_span!("scrape"),
        Phase::Detail => info_span!("detail"),
        Phase::WriteBackup => info_span!("write_backup"),
        Phase::WriteReport => info_span!("write_report"),
    }}
}

impl OpMarker for Collect {
    const NAME: &'static str = "collect";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("collect") }
}

use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Report;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Load, Aggregate, WriteReport }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Load => "load",
        Phase::Aggregate => "aggregate",
        Phase::WriteReport => "write_report",
    }}
    fn span(&self) -> Span { match self {
        Phase::Load => info_span!("load"),
        Phase::Aggregate => info_span!("aggregate"),
        Phase::WriteReport => info_span!("write_report"),
    }}
}

impl OpMarker for Report {
    const NAME: &'static str = "report";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("report") }
}

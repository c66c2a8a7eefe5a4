use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Detail;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Plan, AcquireSession, Extract, WriteBackup }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Plan => "plan",
        Phase::AcquireSession => "acquire_session",
        Phase::Extract => "extract",
        Phase::WriteBackup => "write_backup",
    }}
    fn span(&self) -> Span { match self {
        Phase::Plan => info_span!("plan"),
        Phase::AcquireSession => info_span!("acquire_session"),
        Phase::Extract => info_span!("extract"),
        Phase::WriteBackup => info_span!("write_backup"),
    }}
}

impl OpMarker for Detail {
    const NAME: &'static str = "detail";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("detail") }
}

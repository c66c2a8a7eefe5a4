use std::path::PathBuf;

use serde::Serialize;

use super::Engine;

#[derive(Serialize)]
pub struct DetailPlan {
    pub input: PathBuf,
    pub records: usize,
    pub ignored: usize,
    pub eligible: usize,
    pub engine: Engine,
    pub delay_ms: u64,
}

#[derive(Serialize)]
pub struct DetailRunResult {
    pub input: PathBuf,
    pub backup: PathBuf,
    pub attempted: usize,
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
    pub cancelled: bool,
}

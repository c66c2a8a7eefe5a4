use std::path::PathBuf;

use serde::Serialize;

#[derive(Serialize)]
pub struct CollectPlan {
    pub keywords: Vec<String>,
    pub blog: bool,
    pub stream: bool,
    pub max_blog: usize,
    pub max_stream: usize,
    pub detail: bool,
    pub report: bool,
    pub data_dir: PathBuf,
}

#[derive(Serialize, Default)]
pub struct DetailSummary {
    pub attempted: usize,
    pub success: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, Default)]
pub struct CollectRunResult {
    pub keywords: Vec<String>,
    pub blog_records: usize,
    pub stream_records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<DetailSummary>,
    pub backups: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<PathBuf>,
    pub cancelled: bool,
}

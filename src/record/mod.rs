use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod text;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    BlogSource,
    StreamSource,
}

impl Platform {
    pub fn label(&self) -> &'static str {
        match self {
            Platform::BlogSource => "blog",
            Platform::StreamSource => "stream",
        }
    }
}

/// Derived from the content at collection time; never authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Domestic,
    Foreign,
    Unclassified,
}

impl Region {
    pub fn label(&self) -> &'static str {
        match self {
            Region::Domestic => "domestic",
            Region::Foreign => "foreign",
            Region::Unclassified => "unclassified",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DetailStatus {
    NotAttempted,
    Success,
    Failed {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl DetailStatus {
    pub fn is_success(&self) -> bool { matches!(self, DetailStatus::Success) }
    #[cfg(test)]
    pub fn is_failed(&self) -> bool { matches!(self, DetailStatus::Failed { .. }) }
}

/// One collected post. Metric fields: `None` = not attempted, `Some(0)` = attempted and nothing found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub platform: Platform,
    pub region: Region,
    pub keyword: String,
    pub title_or_text: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_id: String,
    pub source_url: String,
    pub posted_at: String,
    pub collected_at: DateTime<Utc>,
    #[serde(default)]
    pub views: Option<u64>,
    #[serde(default)]
    pub likes: Option<u64>,
    #[serde(default)]
    pub comments: Option<u64>,
    #[serde(default)]
    pub reposts: Option<u64>,
    pub detail_status: DetailStatus,
}

/// Outcome of one detail extraction. Metrics are always defined, `0` on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailResult {
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub status: DetailStatus,
}

impl DetailResult {
    pub fn success(views: u64, likes: u64, comments: u64) -> Self {
        DetailResult { views, likes, comments, status: DetailStatus::Success }
    }

    pub fn failed(error: impl std::fmt::Display) -> Self {
        let msg = error.to_string();
        let error = if msg.trim().is_empty() { "unknown error".to_string() } else { msg };
        DetailResult { views: 0, likes: 0, comments: 0, status: DetailStatus::Failed { error: Some(error) } }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            DetailStatus::Failed { error } => error.as_deref(),
            _ => None,
        }
    }
}

impl NormalizedRecord {
    /// Returns a new record carrying the detail metrics. Identity fields and region are untouched.
    pub fn with_detail(self, detail: DetailResult) -> Self {
        NormalizedRecord {
            views: Some(detail.views),
            likes: Some(detail.likes),
            comments: Some(detail.comments),
            detail_status: detail.status,
            ..self
        }
    }

    pub fn needs_detail(&self) -> bool {
        self.platform == Platform::BlogSource && self.detail_status == DetailStatus::NotAttempted
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::record::text::{classify_region, normalize_stream_date, sanitize};
use crate::record::{DetailStatus, NormalizedRecord, Platform, Region};
use crate::telemetry;
use crate::telemetry::ops::collect::Phase as CollectPhase;

use super::error::CollectError;
use super::Collector;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamAuthor {
    #[serde(default, rename = "userName")]
    pub user_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// One post as returned by the scraping backend's dataset.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamPost {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, rename = "fullText", alias = "full_text")]
    pub full_text: Option<String>,
    #[serde(default, alias = "twitterUrl")]
    pub url: Option<String>,
    #[serde(default, rename = "createdAt", alias = "created_at")]
    pub created_at: Option<String>,
    #[serde(default)]
    pub author: Option<StreamAuthor>,
    #[serde(default, rename = "viewCount")]
    pub view_count: Option<u64>,
    #[serde(default, rename = "likeCount")]
    pub like_count: Option<u64>,
    #[serde(default, rename = "replyCount")]
    pub reply_count: Option<u64>,
    #[serde(default, rename = "retweetCount")]
    pub retweet_count: Option<u64>,
}

impl StreamPost {
    pub fn content(&self) -> &str {
        self.full_text.as_deref().or(self.text.as_deref()).unwrap_or_default()
    }

    fn into_record(self, keyword: &str, collected_at: DateTime<Utc>) -> Option<NormalizedRecord> {
        let source_url = self.url.as_deref().map(str::trim).unwrap_or_default().to_string();
        if source_url.is_empty() { return None; }
        let text = sanitize(self.content());
        let region = classify_region(&text);
        let author = self.author.unwrap_or_default();
        Some(NormalizedRecord {
            platform: Platform::StreamSource,
            region,
            keyword: keyword.to_string(),
            title_or_text: text,
            author_name: author.name.unwrap_or_default(),
            author_id: author.user_name.unwrap_or_default(),
            source_url,
            posted_at: normalize_stream_date(self.created_at.as_deref().unwrap_or_default().trim()),
            collected_at,
            views: Some(self.view_count.unwrap_or(0)),
            likes: Some(self.like_count.unwrap_or(0)),
            comments: Some(self.reply_count.unwrap_or(0)),
            reposts: Some(self.retweet_count.unwrap_or(0)),
            detail_status: DetailStatus::NotAttempted,
        })
    }
}

#[async_trait]
pub trait ScrapeBackend: Send + Sync {
    async fn search_posts(&self, term: &str, limit: usize) -> Result<Vec<StreamPost>, CollectError>;
}

pub fn search_term(keyword: &str) -> String {
    let kw = keyword.trim();
    if kw.starts_with('#') { kw.to_string() } else { format!("#{kw}") }
}

/// Hashtag search through a scraping backend. Metrics come with the posts, so there is no detail phase.
pub struct StreamCollector<B: ScrapeBackend> {
    backend: B,
}

impl<B: ScrapeBackend> StreamCollector<B> {
    pub fn new(backend: B) -> Self { StreamCollector { backend } }
}

#[async_trait]
impl<B: ScrapeBackend> Collector for StreamCollector<B> {
    fn platform(&self) -> Platform { Platform::StreamSource }

    async fn collect(&self, keyword: &str, max_results: usize, cancel: &CancellationToken) -> Vec<NormalizedRecord> {
        let log = telemetry::collect();
        if cancel.is_cancelled() || max_results == 0 { return Vec::new(); }

        let term = search_term(keyword);
        let span = log.span_kv(&CollectPhase::Scrape, [("term", term.clone()), ("limit", max_results.to_string())]);
        let posts = match self.backend.search_posts(&term, max_results).instrument(span).await {
            Ok(posts) => posts,
            Err(e) => {
                log.warn_kv("❌ stream scrape failed", [("keyword", keyword.to_string()), ("error", e.to_string())]);
                return Vec::new();
            }
        };

        let collected_at = Utc::now();
        let out: Vec<NormalizedRecord> = posts.into_iter()
            .filter_map(|p| p.into_record(keyword, collected_at))
            .take(max_results)
            .collect();

        let count = |r: Region| out.iter().filter(|rec| rec.region == r).count();
        log.keyword_summary(Platform::StreamSource, keyword, out.len());
        log.region_split(keyword, count(Region::Domestic), count(Region::Foreign), count(Region::Unclassified));
        out
    }
}

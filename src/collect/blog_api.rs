use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::SearchApiConfig;
use crate::pacing::Pacer;
use crate::record::text::{normalize_date, sanitize};
use crate::record::{DetailStatus, NormalizedRecord, Platform, Region};
use crate::telemetry::{self};
use crate::telemetry::ops::collect::Phase as CollectPhase;

use super::error::{ensure_success, CollectError};
use super::Collector;

/// Largest page the search API serves.
pub const PAGE_SIZE: usize = 100;
/// The API never returns results past this offset for one query.
pub const API_RESULT_CAP: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    pub query: String,
    pub display: usize,
    pub start: usize,
    pub sort: &'static str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlogItem {
    #[serde(default)] pub title: String,
    #[serde(default)] pub link: String,
    #[serde(default)] pub bloggername: String,
    #[serde(default)] pub bloggerlink: String,
    #[serde(default)] pub postdate: String,
}

/// `items` absent means the query is exhausted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub items: Option<Vec<BlogItem>>,
}

#[async_trait]
pub trait SearchApi: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, CollectError>;
}

pub struct NaverSearchClient {
    http: Client,
    base_url: String,
    client_id: String,
    client_secret: String,
}

impl NaverSearchClient {
    pub fn new(cfg: &SearchApiConfig) -> Result<Self, CollectError> {
        let (Some(client_id), Some(client_secret)) = (cfg.client_id.clone(), cfg.client_secret.clone()) else {
            return Err(CollectError::MissingCredentials("NAVER_CLIENT_ID and NAVER_CLIENT_SECRET"));
        };
        let http = Client::builder().timeout(cfg.timeout).build()?;
        Ok(NaverSearchClient { http, base_url: cfg.base_url.clone(), client_id, client_secret })
    }
}

#[async_trait]
impl SearchApi for NaverSearchClient {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, CollectError> {
        let resp = self
            .http
            .get(&self.base_url)
            .header("X-Naver-Client-Id", &self.client_id)
            .header("X-Naver-Client-Secret", &self.client_secret)
            .query(query)
            .send()
            .await?;
        let resp = ensure_success(resp).await?;
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl BlogItem {
    fn into_record(self, keyword: &str, collected_at: DateTime<Utc>) -> Option<NormalizedRecord> {
        let source_url = self.link.trim().to_string();
        if source_url.is_empty() { return None; }
        let author_id = self.bloggerlink.trim().trim_end_matches('/').rsplit('/').next().unwrap_or_default().to_string();
        Some(NormalizedRecord {
            platform: Platform::BlogSource,
            region: Region::Domestic,
            keyword: keyword.to_string(),
            title_or_text: sanitize(&self.title),
            author_name: sanitize(&self.bloggername),
            author_id,
            source_url,
            posted_at: normalize_date(self.postdate.trim()),
            collected_at,
            views: None,
            likes: None,
            comments: None,
            reposts: None,
            detail_status: DetailStatus::NotAttempted,
        })
    }
}

/// Pages through the keyword search API with a fixed spacing between requests.
pub struct BlogApiCollector<A: SearchApi> {
    api: A,
    pacer: Pacer,
}

impl<A: SearchApi> BlogApiCollector<A> {
    pub fn new(api: A, pacer: Pacer) -> Self {
        BlogApiCollector { api, pacer }
    }
}

#[async_trait]
impl<A: SearchApi> Collector for BlogApiCollector<A> {
    fn platform(&self) -> Platform { Platform::BlogSource }

    async fn collect(&self, keyword: &str, max_results: usize, cancel: &CancellationToken) -> Vec<NormalizedRecord> {
        let log = telemetry::collect();
        let max_results = max_results.min(API_RESULT_CAP);
        let mut out: Vec<NormalizedRecord> = Vec::new();
        let mut start = 1usize;

        while start <= max_results {
            if cancel.is_cancelled() {
                log.warn_kv("⏹ cancelled; keeping collected records", [("keyword", keyword.to_string()), ("collected", out.len().to_string())]);
                break;
            }
            let display = PAGE_SIZE.min(max_results - start + 1);
            let query = SearchQuery { query: keyword.to_string(), display, start, sort: "date" };

            self.pacer.wait().await;
            let span = log.span_kv(&CollectPhase::FetchPage, [("start", start.to_string()), ("display", display.to_string())]);
            let page = self.api.search(&query).instrument(span).await;
            self.pacer.stamp();

            let items = match page {
                Ok(SearchResponse { items: Some(items) }) if !items.is_empty() => items,
                Ok(_) => { log.debug(format!("no more results for '{}' at start={}", keyword, start)); break; }
                Err(e) => {
                    log.warn_kv("❌ search request failed; keeping partial results", [("keyword", keyword.to_string()), ("start", start.to_string()), ("error", e.to_string())]);
                    break;
                }
            };

            let returned = items.len();
            let collected_at = Utc::now();
            out.extend(items.into_iter().take(display).filter_map(|it| it.into_record(keyword, collected_at)));
            if returned < display { break; }
            start += display;
        }

        log.keyword_summary(Platform::BlogSource, keyword, out.len());
        out
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{item, MockSearchApi, PagedSearchApi};
    use super::*;
    use crate::pacing::testing::ManualClock;
    use std::sync::Mutex;
    use std::time::Duration;

    fn pacer(clock: std::sync::Arc<ManualClock>) -> Pacer { Pacer::new(Duration::from_millis(150), clock) }

    #[tokio::test]
    async fn pages_in_windows_and_respects_cap() {
        for (max, expected_calls, expected_records) in [(250usize, 3usize, 250usize), (100, 1, 100), (5000, 10, 1000), (1, 1, 1)] {
            let clock = ManualClock::new();
            let api = PagedSearchApi { total: 5000, calls: Mutex::new(Vec::new()) };
            let collector = BlogApiCollector::new(api, pacer(clock.clone()));
            let records = collector.collect("rust", max, &CancellationToken::new()).await;

            let calls = collector.api.calls.lock().unwrap().clone();
            assert_eq!(calls.len(), expected_calls, "max={max}");
            assert!(calls.len() <= max.div_ceil(PAGE_SIZE));
            assert_eq!(records.len(), expected_records, "max={max}");
            assert_eq!(calls[0].start, 1);
            assert!(calls.iter().all(|c| c.display <= PAGE_SIZE && c.start <= API_RESULT_CAP && c.sort == "date"));
            assert_eq!(clock.sleeps(), vec![Duration::from_millis(150); expected_calls - 1]);
        }
    }

    #[tokio::test]
    async fn last_window_is_trimmed_to_remaining() {
        let api = PagedSearchApi { total: 5000, calls: Mutex::new(Vec::new()) };
        let collector = BlogApiCollector::new(api, pacer(ManualClock::new()));
        collector.collect("rust", 250, &CancellationToken::new()).await;
        let calls = collector.api.calls.lock().unwrap().clone();
        let windows: Vec<(usize, usize)> = calls.iter().map(|c| (c.start, c.display)).collect();
        assert_eq!(windows, vec![(1, 100), (101, 100), (201, 50)]);
    }

    #[tokio::test]
    async fn short_page_ends_collection() {
        let api = PagedSearchApi { total: 130, calls: Mutex::new(Vec::new()) };
        let collector = BlogApiCollector::new(api, pacer(ManualClock::new()));
        let records = collector.collect("rust", 1000, &CancellationToken::new()).await;
        assert_eq!(records.len(), 130);
        assert_eq!(collector.api.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn missing_items_is_exhaustion_not_error() {
        let api = MockSearchApi::default();
        api.push(Ok(SearchResponse { items: None }));
        let collector = BlogApiCollector::new(api, pacer(ManualClock::new()));
        let records = collector.collect("rust", 300, &CancellationToken::new()).await;
        assert!(records.is_empty());
        assert_eq!(collector.api.calls().len(), 1);
    }

    #[tokio::test]
    async fn transport_failure_keeps_partial_results() {
        let api = MockSearchApi::default();
        api.push(Ok(SearchResponse { items: Some((1..=100).map(item).collect()) }));
        api.push(Err(CollectError::Api { status: 500, message: "upstream".into() }));
        api.push(Ok(SearchResponse { items: Some((201..=300).map(item).collect()) }));
        let collector = BlogApiCollector::new(api, pacer(ManualClock::new()));
        let records = collector.collect("rust", 300, &CancellationToken::new()).await;
        assert_eq!(records.len(), 100);
        assert_eq!(collector.api.calls().len(), 2);
    }

    #[tokio::test]
    async fn cancelled_before_start_makes_no_calls() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let api = MockSearchApi::default();
        let collector = BlogApiCollector::new(api, pacer(ManualClock::new()));
        assert!(collector.collect("rust", 100, &cancel).await.is_empty());
        assert!(collector.api.calls().is_empty());
    }

    #[tokio::test]
    async fn maps_items_to_records() {
        let api = MockSearchApi::default();
        api.push(Ok(SearchResponse { items: Some(vec![
            BlogItem {
                title: "<b>러스트</b> &amp; 토키오".into(),
                link: "https://blog.example.com/writer01/223".into(),
                bloggername: "작가&#39;s".into(),
                bloggerlink: "blog.example.com/writer01".into(),
                postdate: "20241223".into(),
            },
            BlogItem { link: "   ".into(), ..item(2) },
        ]) }));
        let collector = BlogApiCollector::new(api, pacer(ManualClock::new()));
        let records = collector.collect("러스트", 10, &CancellationToken::new()).await;

        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.platform, Platform::BlogSource);
        assert_eq!(r.region, Region::Domestic);
        assert_eq!(r.keyword, "러스트");
        assert_eq!(r.title_or_text, "러스트 & 토키오");
        assert_eq!(r.author_name, "작가's");
        assert_eq!(r.author_id, "writer01");
        assert_eq!(r.source_url, "https://blog.example.com/writer01/223");
        assert_eq!(r.posted_at, "2024-12-23");
        assert_eq!((r.views, r.likes, r.comments, r.reposts), (None, None, None, None));
        assert_eq!(r.detail_status, DetailStatus::NotAttempted);
    }

    #[test]
    fn client_requires_credentials() {
        let cfg = SearchApiConfig { base_url: "http://localhost".into(), client_id: Some("id".into()), client_secret: None, timeout: Duration::from_secs(1) };
        assert!(matches!(NaverSearchClient::new(&cfg), Err(CollectError::MissingCredentials(_))));
    }
}

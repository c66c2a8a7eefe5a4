use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::error::{ensure_success, CollectError};
use super::stream::{ScrapeBackend, StreamPost};

const BASE_URL: &str = "https://api.apify.com/v2";
const TWEET_SCRAPER: &str = "apidojo~tweet-scraper";
/// Each poll long-waits up to 60s on the server side.
const MAX_POLLS: usize = 10;

#[derive(Debug, Clone, Serialize)]
struct TweetSearchInput<'a> {
    #[serde(rename = "searchTerms")]
    search_terms: Vec<&'a str>,
    #[serde(rename = "maxItems")]
    max_items: usize,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiResponse<T> {
    data: T,
}

#[derive(Debug, Clone, Deserialize)]
struct RunData {
    id: String,
    status: String,
    #[serde(rename = "defaultDatasetId")]
    default_dataset_id: String,
}

/// Tweet search through an Apify actor run: start, wait, fetch dataset.
pub struct ApifyTweetBackend {
    http: Client,
    token: String,
}

impl ApifyTweetBackend {
    pub fn new(token: String, timeout: Duration) -> Result<Self, CollectError> {
        // Long-poll requests hold the connection for up to a minute.
        let http = Client::builder().timeout(timeout.max(Duration::from_secs(70))).build()?;
        Ok(ApifyTweetBackend { http, token })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, CollectError> {
        let resp = self.http.get(url).bearer_auth(&self.token).send().await?;
        let resp = ensure_success(resp).await?;
        Ok(serde_json::from_slice(&resp.bytes().await?)?)
    }

    async fn start_run(&self, term: &str, limit: usize) -> Result<RunData, CollectError> {
        let input = TweetSearchInput { search_terms: vec![term], max_items: limit };
        let url = format!("{}/acts/{}/runs", BASE_URL, TWEET_SCRAPER);
        let resp = self.http.post(&url).bearer_auth(&self.token).json(&input).send().await?;
        let resp = ensure_success(resp).await?;
        let api: ApiResponse<RunData> = serde_json::from_slice(&resp.bytes().await?)?;
        Ok(api.data)
    }

    async fn wait_for_run(&self, run_id: &str) -> Result<RunData, CollectError> {
        let url = format!("{}/actor-runs/{}?waitForFinish=60", BASE_URL, run_id);
        for _ in 0..MAX_POLLS {
            let api: ApiResponse<RunData> = self.get_json(&url).await?;
            match api.data.status.as_str() {
                "SUCCEEDED" => return Ok(api.data),
                "FAILED" | "ABORTED" | "TIMED-OUT" => return Err(CollectError::RunFailed(api.data.status)),
                other => tracing::debug!(run_id, status = other, "run still in progress"),
            }
        }
        Err(CollectError::RunFailed(format!("still running after {} polls", MAX_POLLS)))
    }
}

#[async_trait]
impl ScrapeBackend for ApifyTweetBackend {
    async fn search_posts(&self, term: &str, limit: usize) -> Result<Vec<StreamPost>, CollectError> {
        let run = self.start_run(term, limit).await?;
        tracing::debug!(run_id = %run.id, "scrape run started");
        let done = self.wait_for_run(&run.id).await?;
        let url = format!("{}/datasets/{}/items?format=json", BASE_URL, done.default_dataset_id);
        self.get_json(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_wire_shape() {
        let v = serde_json::to_value(TweetSearchInput { search_terms: vec!["#rust"], max_items: 50 }).unwrap();
        assert_eq!(v, serde_json::json!({"searchTerms": ["#rust"], "maxItems": 50}));
    }

    #[test]
    fn run_envelope_decodes() {
        let raw = r#"{"data": {"id": "r1", "status": "RUNNING", "defaultDatasetId": "d1", "extra": 1}}"#;
        let api: ApiResponse<RunData> = serde_json::from_str(raw).unwrap();
        assert_eq!(api.data.id, "r1");
        assert_eq!(api.data.default_dataset_id, "d1");
    }
}

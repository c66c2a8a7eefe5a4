use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_SEARCH_URL: &str = "https://openapi.naver.com/v1/search/blog.json";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_OUTPUT_DIR: &str = "output";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Clone, Debug)]
pub struct SearchApiConfig {
    pub base_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub search: SearchApiConfig,
    pub apify_token: Option<String>,
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub http_timeout: Duration,
    pub user_agent: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let timeout = Duration::from_secs(DEFAULT_TIMEOUT_SECS);
        Self {
            search: SearchApiConfig {
                base_url: DEFAULT_SEARCH_URL.to_string(),
                client_id: None,
                client_secret: None,
                timeout,
            },
            apify_token: None,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            http_timeout: timeout,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        let non_empty = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        cfg.search.client_id = non_empty("NAVER_CLIENT_ID");
        cfg.search.client_secret = non_empty("NAVER_CLIENT_SECRET");
        if let Some(base) = non_empty("KPI_SEARCH_BASE_URL") { cfg.search.base_url = base; }
        cfg.apify_token = non_empty("APIFY_TOKEN");
        if let Some(dir) = non_empty("KPI_DATA_DIR") { cfg.data_dir = PathBuf::from(dir); }
        if let Some(dir) = non_empty("KPI_OUTPUT_DIR") { cfg.output_dir = PathBuf::from(dir); }
        if let Some(secs) = non_empty("KPI_HTTP_TIMEOUT_SECS").and_then(|v| v.parse::<u64>().ok()) {
            cfg.http_timeout = Duration::from_secs(secs);
            cfg.search.timeout = cfg.http_timeout;
        }
        if let Some(ua) = non_empty("KPI_USER_AGENT") { cfg.user_agent = ua; }
        cfg
    }
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("network error: {0}")]
    Network(String),

    #[error("api error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("decode error: {0}")]
    Decode(String),

    #[error("scrape run ended with status: {0}")]
    RunFailed(String),

    #[error("missing credentials: {0}")]
    MissingCredentials(&'static str),
}

impl From<reqwest::Error> for CollectError {
    fn from(err: reqwest::Error) -> Self {
        CollectError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for CollectError {
    fn from(err: serde_json::Error) -> Self {
        CollectError::Decode(err.to_string())
    }
}

/// Turns a non-2xx response into `CollectError::Api`, keeping the body as the message.
pub(crate) async fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response, CollectError> {
    let status = resp.status();
    if status.is_success() { return Ok(resp); }
    let body = resp.text().await.unwrap_or_default();
    Err(CollectError::Api { status: status.as_u16(), message: body })
}

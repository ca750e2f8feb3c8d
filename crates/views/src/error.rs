use thiserror::Error;

/// A failed read. Views store its message as their `error` string.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("response has no data")]
    MissingData,

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid API base URL {url}: {reason}")]
    BaseUrl { url: String, reason: String },
}

use thiserror::Error;

/// Errors raised while talking to the push endpoint.
///
/// These never leave the feed client: every one of them is treated as a
/// connection loss and fed into the reconnect state machine.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("push endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("stream error: {0}")]
    Stream(String),
}

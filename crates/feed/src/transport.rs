use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use tracing::{debug, instrument};

use crate::error::FeedError;
use crate::sse::SseParser;

/// Message payloads of one open connection. The stream ending means the
/// server closed the connection.
pub type MessageStream = Pin<Box<dyn Stream<Item = Result<String, FeedError>> + Send>>;

/// Opens connections to the push endpoint.
///
/// Dropping the returned stream closes the connection.
#[async_trait]
pub trait ChangeTransport: Send + Sync {
    async fn connect(&self) -> Result<MessageStream, FeedError>;

    /// Endpoint label for logs.
    fn endpoint(&self) -> &str;
}

/// `text/event-stream` over HTTP.
pub struct SseTransport {
    http: reqwest::Client,
    url: String,
}

impl SseTransport {
    /// No overall request timeout: the response body stays open for as long
    /// as the server keeps the channel up.
    pub fn new(url: impl Into<String>, connect_timeout: Duration) -> Result<Self, FeedError> {
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self::with_client(http, url))
    }

    pub fn with_client(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }
}

#[async_trait]
impl ChangeTransport for SseTransport {
    #[instrument(skip_all, fields(url = %self.url))]
    async fn connect(&self) -> Result<MessageStream, FeedError> {
        let resp = self
            .http
            .get(&self.url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(FeedError::Status { status, body });
        }
        debug!(url = %self.url, "event stream accepted");

        let events = SseParser::new(Box::pin(resp.bytes_stream()));
        Ok(Box::pin(events.map(|event| event.map(|e| e.data))))
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

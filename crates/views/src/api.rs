//! HTTP client for the stats read endpoints.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use roster_core::config::ApiConfig;
use roster_core::{MatchRecord, MatchType};
use roster_stats::{PlayerBreakdown, TeamStats};

use crate::envelope;
use crate::error::ApiError;
use crate::source::StatsSource;

/// Client for the REST API. Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct StatsApi {
    base: Url,
    http: reqwest::Client,
}

impl StatsApi {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Self::with_client(http, &config.base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> Result<Self, ApiError> {
        let base = Url::parse(base_url.trim_end_matches('/')).map_err(|e| ApiError::BaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(ApiError::BaseUrl {
                url: base_url.to_string(),
                reason: "not a hierarchical URL".to_string(),
            });
        }
        Ok(Self { base, http })
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    /// Base URL with `segments` appended, each percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        debug!(url = %url, "GET");
        let resp = self.http.get(url).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }

        let body = resp.text().await?;
        envelope::decode(&body)
    }
}

#[async_trait]
impl StatsSource for StatsApi {
    async fn matches(&self, subject: &str, match_type: MatchType) -> Result<Vec<MatchRecord>, ApiError> {
        let mut url = self.endpoint(&["matches"]);
        url.query_pairs_mut()
            .append_pair("subject", subject)
            .append_pair("type", match_type.as_str());
        self.get(url).await
    }

    async fn team_stats(&self, team_id: &str) -> Result<TeamStats, ApiError> {
        self.get(self.endpoint(&["teams", team_id, "stats"])).await
    }

    async fn player_breakdown(&self, player_id: &str) -> Result<PlayerBreakdown, ApiError> {
        self.get(self.endpoint(&["players", player_id, "stats", "breakdown"]))
            .await
    }
}

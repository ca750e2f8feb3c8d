use std::sync::Arc;

use async_trait::async_trait;

use roster_core::{MatchRecord, MatchType};
use roster_stats::{PlayerBreakdown, TeamStats};

use crate::error::ApiError;

/// The three reads the live views depend on.
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// `GET /matches?subject=<id>&type=<scrim|tournament>`
    async fn matches(&self, subject: &str, match_type: MatchType) -> Result<Vec<MatchRecord>, ApiError>;

    /// `GET /teams/{id}/stats`
    async fn team_stats(&self, team_id: &str) -> Result<TeamStats, ApiError>;

    /// `GET /players/{id}/stats/breakdown`
    async fn player_breakdown(&self, player_id: &str) -> Result<PlayerBreakdown, ApiError>;
}

#[async_trait]
impl<T: StatsSource + ?Sized> StatsSource for Arc<T> {
    async fn matches(&self, subject: &str, match_type: MatchType) -> Result<Vec<MatchRecord>, ApiError> {
        (**self).matches(subject, match_type).await
    }

    async fn team_stats(&self, team_id: &str) -> Result<TeamStats, ApiError> {
        (**self).team_stats(team_id).await
    }

    async fn player_breakdown(&self, player_id: &str) -> Result<PlayerBreakdown, ApiError> {
        (**self).player_breakdown(player_id).await
    }
}

//! Loaders for the dashboard surfaces that follow live data.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use roster_core::{AuthorizationContext, MatchType};
use roster_stats::{
    available_windows, can_view_advanced, gate, AgentPerformance, BasicStats, Dimension, DrillDown,
    DrillDownResolver, KdaTier, PlayerBreakdown, StatsAggregator, TeamSummary, TimeWindow,
    WindowSelection,
};

use crate::error::ApiError;
use crate::live::ViewLoader;
use crate::source::StatsSource;

/// Player profile: headline stats for the chosen month plus advanced
/// breakdown tables when the viewer is allowed to see them.
pub struct PlayerDashboard {
    source: Arc<dyn StatsSource>,
    player_id: String,
    match_type: MatchType,
    window: String,
    viewer: AuthorizationContext,
    name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDashboardData {
    /// Every month present in the full history, newest first.
    pub windows: Vec<TimeWindow>,
    /// Label of the window actually applied.
    pub window: String,
    pub summary: BasicStats,
    pub tier: KdaTier,
    pub agents: Vec<AgentPerformance>,
    pub advanced: Option<PlayerBreakdown>,
}

impl PlayerDashboard {
    pub fn new(
        source: Arc<dyn StatsSource>,
        player_id: impl Into<String>,
        match_type: MatchType,
        viewer: AuthorizationContext,
    ) -> Self {
        let player_id = player_id.into();
        Self {
            name: format!("player:{player_id}:{match_type}"),
            source,
            player_id,
            match_type,
            window: roster_stats::ALL_WINDOWS.to_string(),
            viewer,
        }
    }

    /// Month label (`"May 2024"` or `"2024-05"`). Labels not present in the
    /// data fall back to all matches.
    pub fn with_window(mut self, label: impl Into<String>) -> Self {
        self.window = label.into();
        self
    }
}

#[async_trait]
impl ViewLoader for PlayerDashboard {
    type Output = PlayerDashboardData;

    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Result<PlayerDashboardData, ApiError> {
        let history = self.source.matches(&self.player_id, self.match_type).await?;
        let windows = available_windows(&history);
        let selection = WindowSelection::from_label(&self.window, &windows);
        let scoped = selection.apply(&history);

        let stats = StatsAggregator::new(&scoped);
        let summary = stats.summary();
        debug!(
            player = %self.player_id,
            window = %selection.label(),
            games = summary.games,
            "player dashboard derived"
        );
        Ok(PlayerDashboardData {
            tier: KdaTier::from_formatted(&summary.kda),
            window: selection.label().to_string(),
            agents: stats.agent_performance(),
            advanced: gate(&self.viewer, || stats.player_breakdown()),
            summary,
            windows,
        })
    }
}

/// Team page for one match type, read from the server-side team summary.
pub struct TeamDashboard {
    source: Arc<dyn StatsSource>,
    team_id: String,
    match_type: MatchType,
    name: String,
}

impl TeamDashboard {
    pub fn new(source: Arc<dyn StatsSource>, team_id: impl Into<String>, match_type: MatchType) -> Self {
        let team_id = team_id.into();
        Self {
            name: format!("team:{team_id}:{match_type}"),
            source,
            team_id,
            match_type,
        }
    }
}

#[async_trait]
impl ViewLoader for TeamDashboard {
    type Output = TeamSummary;

    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Result<TeamSummary, ApiError> {
        let stats = self.source.team_stats(&self.team_id).await?;
        Ok(stats.for_type(self.match_type).clone())
    }
}

/// Server-computed breakdown, fetched only for viewers allowed to see it.
pub struct BreakdownView {
    source: Arc<dyn StatsSource>,
    player_id: String,
    viewer: AuthorizationContext,
    name: String,
}

impl BreakdownView {
    pub fn new(source: Arc<dyn StatsSource>, player_id: impl Into<String>, viewer: AuthorizationContext) -> Self {
        let player_id = player_id.into();
        Self {
            name: format!("breakdown:{player_id}"),
            source,
            player_id,
            viewer,
        }
    }
}

#[async_trait]
impl ViewLoader for BreakdownView {
    /// `None` when the viewer may not see advanced detail.
    type Output = Option<PlayerBreakdown>;

    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Result<Option<PlayerBreakdown>, ApiError> {
        if !can_view_advanced(&self.viewer) {
            return Ok(None);
        }
        Ok(Some(self.source.player_breakdown(&self.player_id).await?))
    }
}

/// One agent, role or map of a player's history.
pub struct DrillDownView {
    source: Arc<dyn StatsSource>,
    player_id: String,
    match_type: MatchType,
    dimension: Dimension,
    value: String,
    viewer: AuthorizationContext,
    name: String,
}

impl DrillDownView {
    pub fn new(
        source: Arc<dyn StatsSource>,
        player_id: impl Into<String>,
        match_type: MatchType,
        dimension: Dimension,
        value: impl Into<String>,
        viewer: AuthorizationContext,
    ) -> Self {
        let player_id = player_id.into();
        let value = value.into();
        Self {
            name: format!("drilldown:{player_id}:{dimension}:{value}"),
            source,
            player_id,
            match_type,
            dimension,
            value,
            viewer,
        }
    }
}

#[async_trait]
impl ViewLoader for DrillDownView {
    type Output = DrillDown;

    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Result<DrillDown, ApiError> {
        let history = self.source.matches(&self.player_id, self.match_type).await?;
        Ok(DrillDownResolver::new(&history).resolve(self.dimension, &self.value, &self.viewer))
    }
}

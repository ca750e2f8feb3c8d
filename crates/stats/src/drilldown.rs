use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use roster_core::{AuthorizationContext, MatchRecord};

use crate::aggregate::{BasicStats, Dimension, StatsAggregator};
use crate::auth::gate;
use crate::trend::{newest_first, trend_series, TrendPoint};

/// Focused view of one agent, role or map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrillDown {
    pub dimension: Dimension,
    pub value: String,
    /// Always visible.
    pub summary: BasicStats,
    /// Present only when the viewer may see advanced detail.
    pub detail: Option<DrillDownDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrillDownDetail {
    /// Oldest first.
    pub trend: Vec<TrendPoint>,
    /// Newest first.
    pub matches: Vec<MatchRecord>,
    /// Agents played under the role, ordered by first appearance in the full
    /// history. Empty for agent and map drill-downs.
    pub agents_used: Vec<String>,
}

/// Resolves drill-downs against one subject's full match history.
#[derive(Debug, Clone, Copy)]
pub struct DrillDownResolver<'a> {
    history: &'a [MatchRecord],
}

impl<'a> DrillDownResolver<'a> {
    pub fn new(history: &'a [MatchRecord]) -> Self {
        Self { history }
    }

    /// Records whose `dimension` field equals `value` exactly, in input order.
    pub fn matching(&self, dimension: Dimension, value: &str) -> Vec<MatchRecord> {
        self.history
            .iter()
            .filter(|r| dimension.value_of(r) == value)
            .cloned()
            .collect()
    }

    pub fn resolve(&self, dimension: Dimension, value: &str, ctx: &AuthorizationContext) -> DrillDown {
        let subset = self.matching(dimension, value);
        let summary = StatsAggregator::new(&subset).summary();
        let detail = gate(ctx, || DrillDownDetail {
            trend: trend_series(subset.iter()),
            matches: newest_first(subset.iter()),
            agents_used: match dimension {
                Dimension::Role => self.agents_for_role(value),
                _ => Vec::new(),
            },
        });
        debug!(
            dimension = %dimension,
            value = %value,
            games = summary.games,
            advanced = detail.is_some(),
            "drill-down resolved"
        );
        DrillDown {
            dimension,
            value: value.to_string(),
            summary,
            detail,
        }
    }

    /// Distinct non-empty agents played under `role`.
    pub fn agents_for_role(&self, role: &str) -> Vec<String> {
        let used: HashSet<&str> = self
            .history
            .iter()
            .filter(|r| r.role == role && !r.agent.is_empty())
            .map(|r| r.agent.as_str())
            .collect();
        let mut seen: HashSet<&str> = HashSet::new();
        self.history
            .iter()
            .map(|r| r.agent.as_str())
            .filter(|agent| used.contains(agent) && seen.insert(agent))
            .map(str::to_string)
            .collect()
    }
}

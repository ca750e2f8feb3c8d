//! Derived statistics over raw match history.
//!
//! Every function here is a pure transformation of a borrowed
//! `&[MatchRecord]`: calling it twice on the same input yields the same
//! output, and nothing is cached between calls.

pub mod aggregate;
pub mod auth;
pub mod drilldown;
pub mod kda;
pub mod outcome;
pub mod team;
pub mod trend;
pub mod window;

pub use aggregate::{
    AgentPerformance, BasicStats, BreakdownEntry, Dimension, PlayerBreakdown, StatsAggregator,
};
pub use auth::{can_view_advanced, gate, PRIVILEGED_ROLES};
pub use drilldown::{DrillDown, DrillDownDetail, DrillDownResolver};
pub use kda::{calc_kda, win_rate, KdaTier};
pub use outcome::{parse_map_results, record_won, MapOutcome};
pub use team::{team_stats, team_summary, TeamStats, TeamSummary, TopPlayer};
pub use trend::TrendPoint;
pub use window::{available_windows, TimeWindow, WindowSelection, ALL_WINDOWS};

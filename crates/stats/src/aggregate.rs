use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use roster_core::{CoreError, MatchRecord};

use crate::kda::{kda_from_totals, round_mean, win_rate};
use crate::outcome::record_won;
use crate::trend::{self, TrendPoint};

/// Values that mean "no real value" in agent/map fields.
pub const PLACEHOLDER_VALUES: [&str; 4] = ["", "Unknown", "null", "undefined"];

pub fn is_placeholder(value: &str) -> bool {
    PLACEHOLDER_VALUES.contains(&value)
}

/// Field a breakdown or drill-down groups by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Agent,
    Role,
    Map,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Agent, Dimension::Role, Dimension::Map];

    /// The record's raw value for this dimension; absent maps read as "".
    pub fn value_of<'a>(&self, record: &'a MatchRecord) -> &'a str {
        match self {
            Dimension::Agent => &record.agent,
            Dimension::Role => &record.role,
            Dimension::Map => record.map_name(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Agent => "agent",
            Dimension::Role => "role",
            Dimension::Map => "map",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "agent" => Ok(Dimension::Agent),
            "role" => Ok(Dimension::Role),
            "map" => Ok(Dimension::Map),
            other => Err(CoreError::UnknownDimension(other.to_string())),
        }
    }
}

/// One row of a breakdown table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownEntry {
    pub name: String,
    pub games: u32,
    pub wins: u32,
    pub win_rate: u32,
    /// Pooled KDA over the bucket, two decimals.
    pub kd: String,
    pub acs: u32,
}

/// Per-agent summary including how often the agent was picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPerformance {
    pub agent: String,
    pub games: u32,
    pub wins: u32,
    pub win_rate: u32,
    pub pick_rate: u32,
    pub kda: String,
    pub acs: u32,
}

/// Headline numbers shown to every viewer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicStats {
    pub games: u32,
    pub wins: u32,
    pub losses: u32,
    pub win_rate: u32,
    pub kda: String,
    pub acs: u32,
}

/// Shape of `GET /players/{id}/stats/breakdown`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerBreakdown {
    #[serde(default)]
    pub agent_stats: Vec<BreakdownEntry>,
    #[serde(default)]
    pub role_stats: Vec<BreakdownEntry>,
    #[serde(default)]
    pub map_stats: Vec<BreakdownEntry>,
    /// Newest first.
    #[serde(default)]
    pub history: Vec<MatchRecord>,
    /// Oldest first.
    #[serde(default)]
    pub trend_data: Vec<TrendPoint>,
}

/// Running totals for one bucket.
#[derive(Debug, Clone, Default)]
pub(crate) struct Tally {
    pub games: u32,
    pub wins: u32,
    kills: u64,
    deaths: u64,
    assists: u64,
    acs_sum: f64,
}

impl Tally {
    pub fn push(&mut self, record: &MatchRecord) {
        self.games += 1;
        if record_won(record) {
            self.wins += 1;
        }
        self.kills += u64::from(record.kills);
        self.deaths += u64::from(record.deaths);
        self.assists += u64::from(record.assists);
        self.acs_sum += record.acs_or_zero();
    }

    pub fn kda(&self) -> String {
        kda_from_totals(self.kills, self.assists, self.deaths)
    }

    pub fn win_rate(&self) -> u32 {
        win_rate(self.wins, self.games)
    }

    pub fn acs(&self) -> u32 {
        round_mean(self.acs_sum, self.games)
    }

    fn into_entry(self, name: String) -> BreakdownEntry {
        BreakdownEntry {
            win_rate: self.win_rate(),
            kd: self.kda(),
            acs: self.acs(),
            name,
            games: self.games,
            wins: self.wins,
        }
    }
}

/// Group records by key, keeping buckets in first-seen order.
pub(crate) fn group_by<'a, F>(records: &'a [MatchRecord], mut key: F) -> Vec<(&'a str, Tally)>
where
    F: FnMut(&'a MatchRecord) -> Option<&'a str>,
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut buckets: Vec<(&str, Tally)> = Vec::new();
    for record in records {
        let Some(k) = key(record) else { continue };
        let slot = *index.entry(k).or_insert_with(|| {
            buckets.push((k, Tally::default()));
            buckets.len() - 1
        });
        buckets[slot].1.push(record);
    }
    buckets
}

/// Borrowing facade over one subject's history in one match-type context.
#[derive(Debug, Clone, Copy)]
pub struct StatsAggregator<'a> {
    records: &'a [MatchRecord],
}

impl<'a> StatsAggregator<'a> {
    pub fn new(records: &'a [MatchRecord]) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &'a [MatchRecord] {
        self.records
    }

    pub fn summary(&self) -> BasicStats {
        let mut tally = Tally::default();
        for record in self.records {
            tally.push(record);
        }
        BasicStats {
            games: tally.games,
            wins: tally.wins,
            losses: tally.games - tally.wins,
            win_rate: tally.win_rate(),
            kda: tally.kda(),
            acs: tally.acs(),
        }
    }

    /// One entry per distinct non-empty value of `dimension`, exact string
    /// match. Sorted by games descending; ties keep first-seen order.
    pub fn breakdown(&self, dimension: Dimension) -> Vec<BreakdownEntry> {
        let mut entries: Vec<BreakdownEntry> = group_by(self.records, |r| {
            Some(dimension.value_of(r)).filter(|v| !v.is_empty())
        })
        .into_iter()
        .map(|(name, tally)| tally.into_entry(name.to_string()))
        .collect();
        entries.sort_by(|a, b| b.games.cmp(&a.games));
        entries
    }

    /// Per-agent performance, placeholder agents excluded. Pick rate is
    /// relative to every record in scope.
    pub fn agent_performance(&self) -> Vec<AgentPerformance> {
        let total = self.records.len() as u32;
        let mut rows: Vec<AgentPerformance> =
            group_by(self.records, |r| Some(r.agent.as_str()).filter(|a| !is_placeholder(a)))
                .into_iter()
                .map(|(agent, tally)| AgentPerformance {
                    agent: agent.to_string(),
                    games: tally.games,
                    wins: tally.wins,
                    win_rate: tally.win_rate(),
                    pick_rate: win_rate(tally.games, total),
                    kda: tally.kda(),
                    acs: tally.acs(),
                })
                .collect();
        rows.sort_by(|a, b| b.games.cmp(&a.games));
        rows
    }

    /// Chronological series, optionally restricted to one dimension value.
    pub fn trend(&self, filter: Option<(Dimension, &str)>) -> Vec<TrendPoint> {
        match filter {
            Some((dimension, value)) => trend::trend_series(
                self.records.iter().filter(|r| dimension.value_of(r) == value),
            ),
            None => trend::trend_series(self.records.iter()),
        }
    }

    pub fn player_breakdown(&self) -> PlayerBreakdown {
        PlayerBreakdown {
            agent_stats: self.breakdown(Dimension::Agent),
            role_stats: self.breakdown(Dimension::Role),
            map_stats: self.breakdown(Dimension::Map),
            history: trend::newest_first(self.records.iter()),
            trend_data: self.trend(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_core::MatchType;

    fn rec(id: &str, agent: &str, map: Option<&str>, win: bool, k: u32, d: u32, a: u32) -> MatchRecord {
        let mut r = MatchRecord::new(id, MatchType::Scrim);
        r.agent = agent.to_string();
        r.role = "Duelist".to_string();
        r.map = map.map(str::to_string);
        r.is_win = Some(win);
        r.kills = k;
        r.deaths = d;
        r.assists = a;
        r
    }

    #[test]
    fn breakdown_pools_kda_across_bucket() {
        let records = vec![
            rec("1", "Echo", Some("Ascent"), true, 10, 2, 4),
            rec("2", "Echo", Some("Bind"), false, 4, 6, 2),
        ];
        let rows = StatsAggregator::new(&records).breakdown(Dimension::Agent);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Echo");
        assert_eq!(rows[0].games, 2);
        assert_eq!(rows[0].win_rate, 50);
        assert_eq!(rows[0].kd, "2.50");
    }

    #[test]
    fn breakdown_is_case_sensitive_and_untrimmed() {
        let records = vec![
            rec("1", "Echo", None, true, 1, 1, 1),
            rec("2", "echo", None, true, 1, 1, 1),
            rec("3", "Echo ", None, true, 1, 1, 1),
        ];
        let rows = StatsAggregator::new(&records).breakdown(Dimension::Agent);
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Echo", "echo", "Echo "]);
    }

    #[test]
    fn map_breakdown_skips_absent_but_keeps_unknown() {
        let records = vec![
            rec("1", "Echo", None, true, 1, 1, 1),
            rec("2", "Echo", Some(""), true, 1, 1, 1),
            rec("3", "Echo", Some("Unknown"), false, 1, 1, 1),
            rec("4", "Echo", Some("Haven"), false, 1, 1, 1),
            rec("5", "Echo", Some("Haven"), true, 1, 1, 1),
        ];
        let rows = StatsAggregator::new(&records).breakdown(Dimension::Map);
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Haven", "Unknown"]);
    }

    #[test]
    fn agent_performance_excludes_placeholders_but_counts_them_for_pick_rate() {
        let records = vec![
            rec("1", "Echo", None, true, 1, 1, 1),
            rec("2", "Echo", None, false, 1, 1, 1),
            rec("3", "Unknown", None, true, 1, 1, 1),
            rec("4", "undefined", None, true, 1, 1, 1),
        ];
        let rows = StatsAggregator::new(&records).agent_performance();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].agent, "Echo");
        assert_eq!(rows[0].pick_rate, 50);
        assert_eq!(rows[0].win_rate, 50);
    }

    #[test]
    fn ties_in_games_keep_first_seen_order() {
        let records = vec![
            rec("1", "Sova", None, true, 1, 1, 1),
            rec("2", "Jett", None, true, 1, 1, 1),
            rec("3", "Jett", None, true, 1, 1, 1),
            rec("4", "Omen", None, true, 1, 1, 1),
        ];
        let rows = StatsAggregator::new(&records).breakdown(Dimension::Agent);
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Jett", "Sova", "Omen"]);
    }

    #[test]
    fn summary_of_empty_history() {
        let summary = StatsAggregator::new(&[]).summary();
        assert_eq!(summary.games, 0);
        assert_eq!(summary.win_rate, 0);
        assert_eq!(summary.kda, "0.00");
    }

    #[test]
    fn dimension_parses_from_str() {
        assert_eq!("Role".parse::<Dimension>().unwrap(), Dimension::Role);
        assert_eq!(
            "weapon".parse::<Dimension>(),
            Err(CoreError::UnknownDimension("weapon".to_string()))
        );
    }
}

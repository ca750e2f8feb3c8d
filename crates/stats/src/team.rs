use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use roster_core::{MatchRecord, MatchType};

use crate::aggregate::{group_by, AgentPerformance, StatsAggregator};
use crate::kda::{kda_value, win_rate};
use crate::outcome::record_won;

/// Number of players listed in a team summary.
pub const TOP_PLAYER_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopPlayer {
    #[serde(default)]
    pub player_id: Option<String>,
    pub name: String,
    pub games: u32,
    pub kda: String,
    pub acs: u32,
    pub win_rate: u32,
}

/// One match-type half of `GET /teams/{id}/stats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSummary {
    #[serde(default)]
    pub games_played: u32,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub win_rate: u32,
    #[serde(default)]
    pub top_players: Vec<TopPlayer>,
    #[serde(default)]
    pub agent_stats: Vec<AgentPerformance>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamStats {
    #[serde(default)]
    pub scrim: TeamSummary,
    #[serde(default)]
    pub tournament: TeamSummary,
}

impl TeamStats {
    pub fn for_type(&self, match_type: MatchType) -> &TeamSummary {
        match match_type {
            MatchType::Scrim => &self.scrim,
            MatchType::Tournament => &self.tournament,
        }
    }
}

/// Roster-wide summary for records of a single match type.
///
/// Several players share one match, so games are counted by distinct
/// `(match_type, match_id)` and each match's outcome is taken from the
/// first record seen for it.
pub fn team_summary(records: &[MatchRecord]) -> TeamSummary {
    let mut seen: HashSet<(MatchType, &str)> = HashSet::new();
    let mut games = 0u32;
    let mut wins = 0u32;
    for record in records {
        if seen.insert((record.match_type, record.match_id.as_str())) {
            games += 1;
            if record_won(record) {
                wins += 1;
            }
        }
    }

    TeamSummary {
        games_played: games,
        wins,
        losses: games - wins,
        win_rate: win_rate(wins, games),
        top_players: top_players(records),
        agent_stats: StatsAggregator::new(records).agent_performance(),
    }
}

/// Split a mixed history by match type and summarise each half.
pub fn team_stats(records: &[MatchRecord]) -> TeamStats {
    let (scrims, tournaments): (Vec<MatchRecord>, Vec<MatchRecord>) = records
        .iter()
        .cloned()
        .partition(|r| r.match_type == MatchType::Scrim);
    TeamStats {
        scrim: team_summary(&scrims),
        tournament: team_summary(&tournaments),
    }
}

fn player_key(record: &MatchRecord) -> Option<&str> {
    record
        .player_id
        .as_deref()
        .or(record.player_name.as_deref())
        .filter(|k| !k.is_empty())
}

/// Highest average ACS first, then pooled KDA; full ties keep first-seen order.
fn top_players(records: &[MatchRecord]) -> Vec<TopPlayer> {
    let mut players: Vec<TopPlayer> = group_by(records, player_key)
        .into_iter()
        .map(|(key, tally)| {
            let sample = records
                .iter()
                .find(|r| player_key(r) == Some(key));
            TopPlayer {
                player_id: sample.and_then(|r| r.player_id.clone()),
                name: sample
                    .and_then(|r| r.player_name.clone())
                    .unwrap_or_else(|| key.to_string()),
                games: tally.games,
                kda: tally.kda(),
                acs: tally.acs(),
                win_rate: tally.win_rate(),
            }
        })
        .collect();
    players.sort_by(|a, b| {
        b.acs.cmp(&a.acs).then_with(|| {
            kda_value(&b.kda)
                .partial_cmp(&kda_value(&a.kda))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    });
    players.truncate(TOP_PLAYER_LIMIT);
    players
}

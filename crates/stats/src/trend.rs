use serde::{Deserialize, Serialize};

use roster_core::MatchRecord;

use crate::kda::{calc_kda, kda_value};
use crate::outcome::record_won;

/// One match on a chart. Each point carries that match's own KDA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub match_id: String,
    pub date: String,
    pub timestamp: i64,
    pub kda: f64,
    pub acs: f64,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub win: bool,
}

impl TrendPoint {
    fn from_record(record: &MatchRecord, timestamp: i64) -> Self {
        Self {
            match_id: record.match_id.clone(),
            date: record.date.clone().unwrap_or_default(),
            timestamp,
            kda: kda_value(&calc_kda(record.kills, record.assists, record.deaths)),
            acs: record.acs_or_zero(),
            kills: record.kills,
            deaths: record.deaths,
            assists: record.assists,
            win: record_won(record),
        }
    }
}

/// Oldest-first series. Equal dates keep input order; undated records
/// have no position on the axis and are left out.
pub fn trend_series<'a>(records: impl Iterator<Item = &'a MatchRecord>) -> Vec<TrendPoint> {
    let mut points: Vec<TrendPoint> = records
        .filter_map(|r| r.timestamp_ms().map(|ts| TrendPoint::from_record(r, ts)))
        .collect();
    points.sort_by_key(|p| p.timestamp);
    points
}

/// Newest-first copy for review lists. Undated records go last, in input order.
pub fn newest_first<'a>(records: impl Iterator<Item = &'a MatchRecord>) -> Vec<MatchRecord> {
    let mut keyed: Vec<(Option<i64>, &MatchRecord)> =
        records.map(|r| (r.timestamp_ms(), r)).collect();
    // `None` sorts below every `Some`, so reversing the key puts undated last.
    keyed.sort_by(|a, b| b.0.cmp(&a.0));
    keyed.into_iter().map(|(_, r)| r.clone()).collect()
}

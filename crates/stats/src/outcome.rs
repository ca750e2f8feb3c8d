//! Match-level win/loss derivation.

use serde_json::Value;
use tracing::debug;

use roster_core::MatchRecord;

/// Result of a single map inside a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapOutcome {
    Win,
    Loss,
    /// Draws, pending maps and anything unrecognised.
    Other,
}

impl MapOutcome {
    fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "WIN" | "W" => MapOutcome::Win,
            "LOSS" | "L" => MapOutcome::Loss,
            _ => MapOutcome::Other,
        }
    }
}

/// Parse a JSON-encoded per-map result list.
///
/// Accepts `["WIN","LOSS"]` or `[{"map":"Ascent","result":"WIN"}, ...]`.
/// A malformed payload contributes no maps rather than failing the record.
pub fn parse_map_results(raw: &str) -> Vec<MapOutcome> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, "unparseable map results, treating as empty");
            return Vec::new();
        }
    };
    let Value::Array(items) = value else {
        debug!("map results payload is not an array, treating as empty");
        return Vec::new();
    };
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => MapOutcome::from_label(s),
            Value::Object(obj) => obj
                .get("result")
                .or_else(|| obj.get("outcome"))
                .and_then(Value::as_str)
                .map(MapOutcome::from_label)
                .unwrap_or(MapOutcome::Other),
            _ => MapOutcome::Other,
        })
        .collect()
}

/// Strict majority of map wins. A tied series counts as a loss.
pub fn majority_win(outcomes: &[MapOutcome]) -> bool {
    let wins = outcomes.iter().filter(|o| **o == MapOutcome::Win).count();
    let losses = outcomes.iter().filter(|o| **o == MapOutcome::Loss).count();
    wins > losses
}

/// Whether the record counts as a win: the explicit flag when present,
/// otherwise the majority of its per-map results.
pub fn record_won(record: &MatchRecord) -> bool {
    if let Some(win) = record.is_win {
        return win;
    }
    record
        .map_results
        .as_deref()
        .map(|raw| majority_win(&parse_map_results(raw)))
        .unwrap_or(false)
}

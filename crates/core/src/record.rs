use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// Competitive context a match was played in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Scrim,
    Tournament,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Scrim => "scrim",
            MatchType::Tournament => "tournament",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scrim" => Ok(MatchType::Scrim),
            "tournament" => Ok(MatchType::Tournament),
            other => Err(CoreError::UnknownMatchType(other.to_string())),
        }
    }
}

/// One player's participation in one completed match, as served by the backend.
///
/// Records are read-only inputs: every derived view is recomputed from the
/// full sequence whenever a refresh signal arrives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    /// Opaque id, unique only within `match_type`.
    #[serde(deserialize_with = "opaque_id")]
    pub match_id: String,
    pub match_type: MatchType,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub opponent: Option<String>,
    #[serde(default)]
    pub map: Option<String>,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub agent: String,
    /// May hold several comma-separated roles.
    #[serde(default, deserialize_with = "string_or_empty")]
    pub role: String,
    #[serde(default)]
    pub kills: u32,
    #[serde(default)]
    pub deaths: u32,
    #[serde(default)]
    pub assists: u32,
    #[serde(default)]
    pub acs: Option<f64>,
    #[serde(
        default,
        deserialize_with = "win_flag",
        serialize_with = "ser_win_flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_win: Option<bool>,
    /// JSON-encoded per-map outcomes, present on team-level records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_results: Option<String>,
    #[serde(default, deserialize_with = "opt_opaque_id", skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_name: Option<String>,
}

impl MatchRecord {
    /// Minimal record used by builders and tests.
    pub fn new(match_id: impl Into<String>, match_type: MatchType) -> Self {
        Self {
            match_id: match_id.into(),
            match_type,
            date: None,
            opponent: None,
            map: None,
            agent: String::new(),
            role: String::new(),
            kills: 0,
            deaths: 0,
            assists: 0,
            acs: None,
            is_win: None,
            map_results: None,
            player_id: None,
            player_name: None,
        }
    }

    pub fn acs_or_zero(&self) -> f64 {
        self.acs.filter(|v| v.is_finite()).unwrap_or(0.0)
    }

    /// Match date as milliseconds since the Unix epoch, if parseable.
    pub fn timestamp_ms(&self) -> Option<i64> {
        self.date.as_deref().and_then(parse_timestamp_ms)
    }

    pub fn map_name(&self) -> &str {
        self.map.as_deref().unwrap_or("")
    }
}

/// Parse the date formats the backend emits into epoch milliseconds.
///
/// Naive timestamps are read as UTC.
pub fn parse_timestamp_ms(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().timestamp_millis())
}

// ── serde helpers ─────────────────────────────────────────────

fn value_to_id(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn opaque_id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(d)?;
    value_to_id(value).ok_or_else(|| serde::de::Error::custom("expected string or number id"))
}

fn opt_opaque_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(d)?;
    Ok(value.and_then(value_to_id))
}

fn string_or_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

fn win_flag<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(d)?;
    Ok(match value {
        Some(serde_json::Value::Bool(b)) => Some(b),
        Some(serde_json::Value::Number(n)) => n.as_f64().map(|v| v == 1.0),
        Some(serde_json::Value::String(s)) => match s.as_str() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

fn ser_win_flag<S: Serializer>(value: &Option<bool>, s: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(win) => s.serialize_u8(u8::from(*win)),
        None => s.serialize_none(),
    }
}

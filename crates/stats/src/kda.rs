//! Ratio and percentage formatting shared by every derived view.
//!
//! All rounding is done in integer arithmetic on hundredths so results are
//! exact: half-way values always round up.

use serde::{Deserialize, Serialize};

/// `(kills + assists) / max(deaths, 1)` formatted to exactly two decimals.
pub fn calc_kda(kills: u32, assists: u32, deaths: u32) -> String {
    kda_from_totals(u64::from(kills), u64::from(assists), u64::from(deaths))
}

/// Pooled KDA over summed totals; `deaths` is floored to 1 after summing.
pub fn kda_from_totals(kills: u64, assists: u64, deaths: u64) -> String {
    format_hundredths(round_ratio(kills + assists, deaths.max(1), 100))
}

/// Numeric value of a formatted KDA string (0.0 when unparseable).
pub fn kda_value(formatted: &str) -> f64 {
    formatted.parse().unwrap_or(0.0)
}

/// `round(part / total * 100)`, 0 when `total` is 0.
pub fn win_rate(part: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    round_ratio(u64::from(part), u64::from(total), 100) as u32
}

/// Rounded mean, 0 for an empty set.
pub fn round_mean(sum: f64, count: u32) -> u32 {
    if count == 0 || !sum.is_finite() {
        return 0;
    }
    (sum / f64::from(count)).round().max(0.0) as u32
}

/// `round(num * scale / den)` with ties rounded up. `den` must be non-zero.
fn round_ratio(num: u64, den: u64, scale: u64) -> u64 {
    (2 * num * scale + den) / (2 * den)
}

fn format_hundredths(hundredths: u64) -> String {
    format!("{}.{:02}", hundredths / 100, hundredths % 100)
}

/// Colour band for a KDA value. Lower bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KdaTier {
    /// Below 1.0.
    Poor,
    /// 1.0 up to 1.2.
    Even,
    /// 1.2 up to 1.5.
    Good,
    /// 1.5 and above.
    Elite,
}

impl KdaTier {
    pub fn from_value(kda: f64) -> Self {
        if kda >= 1.5 {
            KdaTier::Elite
        } else if kda >= 1.2 {
            KdaTier::Good
        } else if kda >= 1.0 {
            KdaTier::Even
        } else {
            KdaTier::Poor
        }
    }

    /// Classify the formatted string, so thresholds apply to the displayed value.
    pub fn from_formatted(formatted: &str) -> Self {
        Self::from_value(kda_value(formatted))
    }
}

//! Calendar-month reporting windows derived from the dates in the data.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use roster_core::MatchRecord;

/// Label of the "no filtering" selection.
pub const ALL_WINDOWS: &str = "All";

/// One calendar month, bounds in epoch milliseconds, both inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    pub label: String,
    pub start: i64,
    pub end: i64,
}

impl TimeWindow {
    /// The UTC calendar month enclosing `timestamp_ms`.
    pub fn month_of(timestamp_ms: i64) -> Option<Self> {
        let date = DateTime::from_timestamp_millis(timestamp_ms)?.date_naive();
        let first = NaiveDate::from_ymd_opt(date.year(), date.month(), 1)?;
        let next = if date.month() == 12 {
            NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)?
        };
        let start = first.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis();
        let next_start = next.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis();
        Some(Self {
            label: first.format("%B %Y").to_string(),
            start,
            end: next_start - 1,
        })
    }

    /// `YYYY-MM` form, accepted alongside the label when selecting.
    pub fn key(&self) -> String {
        DateTime::from_timestamp_millis(self.start)
            .map(|dt| dt.format("%Y-%m").to_string())
            .unwrap_or_default()
    }

    pub fn contains(&self, timestamp_ms: i64) -> bool {
        self.start <= timestamp_ms && timestamp_ms <= self.end
    }
}

/// Every month that has at least one dated record, most recent first.
pub fn available_windows(records: &[MatchRecord]) -> Vec<TimeWindow> {
    let mut seen: HashSet<(i64, i64)> = HashSet::new();
    let mut windows: Vec<TimeWindow> = records
        .iter()
        .filter_map(MatchRecord::timestamp_ms)
        .filter_map(TimeWindow::month_of)
        .filter(|w| seen.insert((w.start, w.end)))
        .collect();
    windows.sort_by(|a, b| b.start.cmp(&a.start));
    windows
}

/// The reporting window a view is showing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowSelection {
    #[default]
    All,
    Month(TimeWindow),
}

impl WindowSelection {
    /// Resolve a user-facing label (`"All"`, `"March 2024"` or `"2024-03"`)
    /// against the windows present in the data. Unknown labels fall back to `All`.
    pub fn from_label(label: &str, windows: &[TimeWindow]) -> Self {
        let label = label.trim();
        if label.eq_ignore_ascii_case(ALL_WINDOWS) {
            return WindowSelection::All;
        }
        windows
            .iter()
            .find(|w| w.label == label || w.key() == label)
            .cloned()
            .map(WindowSelection::Month)
            .unwrap_or(WindowSelection::All)
    }

    pub fn label(&self) -> &str {
        match self {
            WindowSelection::All => ALL_WINDOWS,
            WindowSelection::Month(w) => &w.label,
        }
    }

    /// Inclusive timestamp test; undated records only pass `All`.
    pub fn admits(&self, record: &MatchRecord) -> bool {
        match self {
            WindowSelection::All => true,
            WindowSelection::Month(w) => record.timestamp_ms().is_some_and(|ts| w.contains(ts)),
        }
    }

    pub fn apply(&self, records: &[MatchRecord]) -> Vec<MatchRecord> {
        records.iter().filter(|r| self.admits(r)).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_core::MatchType;

    fn at(id: &str, date: &str) -> MatchRecord {
        let mut r = MatchRecord::new(id, MatchType::Scrim);
        r.date = Some(date.to_string());
        r
    }

    #[test]
    fn month_bounds_are_inclusive() {
        let w = TimeWindow::month_of(roster_core::parse_timestamp_ms("2024-02-10").unwrap()).unwrap();
        assert_eq!(w.label, "February 2024");
        assert_eq!(w.key(), "2024-02");
        assert_eq!(w.start, roster_core::parse_timestamp_ms("2024-02-01").unwrap());
        assert_eq!(w.end, roster_core::parse_timestamp_ms("2024-03-01").unwrap() - 1);
        assert!(w.contains(w.end));
        assert!(!w.contains(w.end + 1));
    }

    #[test]
    fn december_rolls_into_next_year() {
        let w = TimeWindow::month_of(roster_core::parse_timestamp_ms("2023-12-31T23:59:59Z").unwrap()).unwrap();
        assert_eq!(w.end, roster_core::parse_timestamp_ms("2024-01-01").unwrap() - 1);
    }

    #[test]
    fn windows_are_deduplicated_and_newest_first() {
        let records = vec![
            at("1", "2024-01-05"),
            at("2", "2024-03-01"),
            at("3", "2024-01-20"),
            at("4", "garbage"),
        ];
        let labels: Vec<String> = available_windows(&records).into_iter().map(|w| w.label).collect();
        assert_eq!(labels, vec!["March 2024", "January 2024"]);
    }

    #[test]
    fn all_returns_everything_including_undated() {
        let mut undated = MatchRecord::new("u", MatchType::Scrim);
        undated.date = None;
        let records = vec![at("1", "2024-01-05"), undated];
        assert_eq!(WindowSelection::All.apply(&records), records);
    }

    #[test]
    fn month_filter_drops_undated_and_out_of_range() {
        let records = vec![at("jan", "2024-01-05"), at("feb", "2024-02-05"), at("bad", "??")];
        let windows = available_windows(&records);
        let sel = WindowSelection::from_label("2024-01", &windows);
        assert_eq!(sel.label(), "January 2024");
        let ids: Vec<String> = sel.apply(&records).into_iter().map(|r| r.match_id).collect();
        assert_eq!(ids, vec!["jan"]);
    }

    #[test]
    fn unknown_label_falls_back_to_all() {
        assert_eq!(WindowSelection::from_label("May 1999", &[]), WindowSelection::All);
        assert_eq!(WindowSelection::from_label("all", &[]), WindowSelection::All);
    }
}

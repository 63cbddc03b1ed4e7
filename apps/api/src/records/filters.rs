use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{LogEntry, LogStatus};
use crate::views::grouping::episode_keys;

/// User-selected view filters. Every field narrows the set; empty filter matches all.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogFilter {
    pub category: Option<String>,
    pub location: Option<String>,
    pub status: Option<LogStatus>,
    pub episode: Option<String>,
    pub search: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl LogFilter {
    /// Per-record predicates. The episode predicate depends on the whole set and
    /// is applied by `apply`.
    pub fn matches(&self, entry: &LogEntry) -> bool {
        if let Some(category) = &self.category {
            if !entry.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }
        if let Some(location) = &self.location {
            if !entry.location.eq_ignore_ascii_case(location) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if entry.status != status {
                return false;
            }
        }
        if let Some(from) = self.from {
            if entry.timestamp < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if entry.timestamp > to {
                return false;
            }
        }
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let needle = search.to_lowercase();
            let haystacks = [&entry.notes, &entry.activity_type, &entry.location, &entry.category];
            if !haystacks.iter().any(|h| h.to_lowercase().contains(&needle)) {
                return false;
            }
        }
        true
    }

    /// Filters `entries`. Episodes are matched on the same keys the views serve:
    /// explicit ids or derived `AUTO-n` keys, case-insensitive, with or without
    /// the `episode:` node prefix.
    pub fn apply(&self, entries: &[LogEntry], episode_gap_minutes: i64) -> Vec<LogEntry> {
        let wanted = self
            .episode
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(|e| e.strip_prefix("episode:").unwrap_or(e));
        let keys = wanted.map(|_| episode_keys(entries, episode_gap_minutes));

        entries
            .iter()
            .enumerate()
            .filter(|(i, entry)| {
                let in_episode = match (wanted, &keys) {
                    (Some(wanted), Some(keys)) => keys[*i].eq_ignore_ascii_case(wanted),
                    _ => true,
                };
                in_episode && self.matches(entry)
            })
            .map(|(_, entry)| entry.clone())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSummary {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
    pub by_location: BTreeMap<String, usize>,
    pub first_timestamp: Option<DateTime<Utc>>,
    pub last_timestamp: Option<DateTime<Utc>>,
}

pub fn summarize(entries: &[LogEntry]) -> LogSummary {
    let mut by_status: BTreeMap<String, usize> = LogStatus::ALL
        .iter()
        .map(|status| (status.to_string(), 0))
        .collect();
    let mut by_category = BTreeMap::new();
    let mut by_location = BTreeMap::new();
    for entry in entries {
        *by_status.entry(entry.status.to_string()).or_insert(0) += 1;
        *by_category.entry(entry.category.clone()).or_insert(0) += 1;
        *by_location.entry(entry.location.clone()).or_insert(0) += 1;
    }
    LogSummary {
        total: entries.len(),
        by_status,
        by_category,
        by_location,
        first_timestamp: entries.iter().map(|e| e.timestamp).min(),
        last_timestamp: entries.iter().map(|e| e.timestamp).max(),
    }
}

use std::collections::HashMap;

use chrono::Duration;
use serde::Serialize;

use crate::models::LogEntry;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogGroup {
    pub key: String,
    pub entries: Vec<LogEntry>,
}

/// Partitions entries by `key_fn`. Groups keep the order of their first member;
/// members keep input order.
pub fn group_by<F>(entries: &[LogEntry], mut key_fn: F) -> Vec<LogGroup>
where
    F: FnMut(usize, &LogEntry) -> String,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<LogGroup> = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        let key = key_fn(i, entry);
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push(LogGroup {
                key,
                entries: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].entries.push(entry.clone());
    }
    groups
}

pub fn group_by_location(entries: &[LogEntry]) -> Vec<LogGroup> {
    group_by(entries, |_, e| e.location.clone())
}

pub fn group_by_episode(entries: &[LogEntry], gap_minutes: i64) -> Vec<LogGroup> {
    let keys = episode_keys(entries, gap_minutes);
    group_by(entries, |i, _| keys[i].clone())
}

/// Episode key per entry, aligned with `entries`.
///
/// Entries carrying an `episode_id` keep it. The rest are clustered in time
/// order: a new `AUTO-n` episode starts whenever the gap to the previous
/// unassigned entry exceeds `gap_minutes`.
pub fn episode_keys(entries: &[LogEntry], gap_minutes: i64) -> Vec<String> {
    let mut keys: Vec<Option<String>> = entries.iter().map(|e| e.episode_id.clone()).collect();

    let mut pending: Vec<usize> = (0..entries.len()).filter(|&i| keys[i].is_none()).collect();
    pending.sort_by_key(|&i| entries[i].timestamp);

    let gap = Duration::minutes(gap_minutes.max(0));
    let mut episode = 0usize;
    let mut previous = None;
    for i in pending {
        let ts = entries[i].timestamp;
        match previous {
            Some(prev) if ts - prev <= gap => {}
            _ => episode += 1,
        }
        keys[i] = Some(format!("AUTO-{episode}"));
        previous = Some(ts);
    }

    keys.into_iter().map(Option::unwrap_or_default).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::log_entry::{IngestDefaults, PartialLogEntry};
    use crate::records::seed::sample_logs;
    use chrono::{TimeZone, Utc};
    use std::collections::HashSet;

    fn at(hour: u32, minute: u32) -> LogEntry {
        PartialLogEntry {
            timestamp: Utc.with_ymd_and_hms(2024, 2, 1, hour, minute, 0).single(),
            ..Default::default()
        }
        .into_entry(&IngestDefaults::default(), Utc::now())
    }

    fn assert_partition(entries: &[LogEntry], groups: &[LogGroup]) {
        let total: usize = groups.iter().map(|g| g.entries.len()).sum();
        assert_eq!(total, entries.len());
        let ids: HashSet<_> = groups
            .iter()
            .flat_map(|g| g.entries.iter().map(|e| e.id.clone()))
            .collect();
        assert_eq!(ids.len(), entries.len());
    }

    #[test]
    fn test_group_by_location_is_partition() {
        let logs = sample_logs();
        let groups = group_by_location(&logs);
        assert_partition(&logs, &groups);
        assert_eq!(groups[0].key, "North Foundation");
    }

    #[test]
    fn test_group_by_episode_is_partition() {
        let logs = sample_logs();
        let groups = group_by_episode(&logs, 120);
        assert_partition(&logs, &groups);
        assert_eq!(groups.len(), 4);
    }

    #[test]
    fn test_derived_episodes_split_on_gap() {
        let entries = vec![at(8, 0), at(8, 30), at(13, 0), at(9, 45)];
        let keys = episode_keys(&entries, 120);
        assert_eq!(keys[0], keys[1]);
        assert_eq!(keys[1], keys[3]);
        assert_ne!(keys[0], keys[2]);
    }

    #[test]
    fn test_explicit_episode_is_kept() {
        let mut entries = vec![at(8, 0), at(8, 10)];
        entries[1].episode_id = Some("EP-9".to_string());
        let keys = episode_keys(&entries, 120);
        assert_eq!(keys[0], "AUTO-1");
        assert_eq!(keys[1], "EP-9");
    }

    #[test]
    fn test_empty_input() {
        assert!(group_by_location(&[]).is_empty());
        assert!(episode_keys(&[], 60).is_empty());
    }
}

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::LogEntry;
use crate::views::grouping::group_by_episode;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeEvent {
    pub log_id: String,
    pub timestamp: DateTime<Utc>,
    pub headline: String,
    pub notes: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub episode: String,
    pub title: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub locations: Vec<String>,
    pub personnel: Vec<String>,
    pub equipment: Vec<String>,
    pub status_mix: BTreeMap<String, usize>,
    pub events: Vec<NarrativeEvent>,
}

fn distinct<'a>(values: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for v in values {
        if !out.iter().any(|o| o.eq_ignore_ascii_case(v)) {
            out.push(v.clone());
        }
    }
    out
}

/// One chapter per episode, chapters and events in chronological order.
pub fn build_chapters(entries: &[LogEntry], gap_minutes: i64) -> Vec<Chapter> {
    let mut chapters: Vec<Chapter> = group_by_episode(entries, gap_minutes)
        .into_iter()
        .filter_map(|group| {
            let mut events = group.entries;
            events.sort_by_key(|e| e.timestamp);
            let first = events.first()?;
            let last = events.last()?;
            let locations = distinct(events.iter().map(|e| &e.location));
            let mut status_mix = BTreeMap::new();
            for e in &events {
                *status_mix.entry(e.status.to_string()).or_insert(0) += 1;
            }
            let title = match locations.as_slice() {
                [only] => format!("{} at {}", first.activity_type, only),
                [first_loc, rest @ ..] => {
                    format!("{} at {} and {} more", first.activity_type, first_loc, rest.len())
                }
                [] => first.activity_type.clone(),
            };
            Some(Chapter {
                episode: group.key,
                title,
                started_at: first.timestamp,
                ended_at: last.timestamp,
                personnel: distinct(events.iter().flat_map(|e| e.personnel.iter())),
                equipment: distinct(events.iter().flat_map(|e| e.equipment.iter())),
                locations,
                status_mix,
                events: events
                    .iter()
                    .map(|e| NarrativeEvent {
                        log_id: e.id.clone(),
                        timestamp: e.timestamp,
                        headline: format!("{} at {}", e.activity_type, e.location),
                        notes: e.notes.clone(),
                        status: e.status.to_string(),
                    })
                    .collect(),
            })
        })
        .collect();
    chapters.sort_by_key(|c| c.started_at);
    chapters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::seed::sample_logs;

    #[test]
    fn test_chapters_per_episode_in_order() {
        let mut logs = sample_logs();
        logs.reverse();
        let chapters = build_chapters(&logs, 120);
        let episodes: Vec<_> = chapters.iter().map(|c| c.episode.as_str()).collect();
        assert_eq!(episodes, vec!["EP-1", "EP-2", "EP-3", "EP-4"]);
        let events: usize = chapters.iter().map(|c| c.events.len()).sum();
        assert_eq!(events, logs.len());
    }

    #[test]
    fn test_chapter_summaries() {
        let chapters = build_chapters(&sample_logs(), 120);
        let first = &chapters[0];
        assert_eq!(first.title, "Excavation at North Foundation");
        assert_eq!(first.locations, vec!["North Foundation"]);
        assert!(first.personnel.contains(&"Priya Nair".to_string()));
        assert!(first.started_at <= first.ended_at);
        let last = chapters.last().unwrap();
        assert!(last.title.ends_with("and 2 more"));
    }
}

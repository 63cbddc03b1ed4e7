//! Built-in sample records: four site episodes over three days.

use chrono::{DateTime, TimeZone, Utc};

use crate::models::log_entry::{Coordinates, LogEntry, LogStatus};

struct Seed {
    id: &'static str,
    at: (u32, u32, u32),
    location: &'static str,
    coords: (f64, f64),
    category: &'static str,
    activity: &'static str,
    notes: &'static str,
    material: Option<&'static str>,
    equipment: &'static [&'static str],
    personnel: &'static [&'static str],
    episode: &'static str,
    status: LogStatus,
}

const SEEDS: &[Seed] = &[
    Seed {
        id: "seed-001",
        at: (6, 7, 5),
        location: "North Foundation",
        coords: (40.7411, -73.9897),
        category: "Earthworks",
        activity: "Excavation",
        notes: "Excavator cleared the north trench to 2.4m depth.",
        material: Some("Soil"),
        equipment: &["Excavator", "Dump Truck"],
        personnel: &["Maria Lopez", "Tom Reed"],
        episode: "EP-1",
        status: LogStatus::Completed,
    },
    Seed {
        id: "seed-002",
        at: (6, 8, 40),
        location: "North Foundation",
        coords: (40.7412, -73.9896),
        category: "Safety",
        activity: "Inspection",
        notes: "Trench shoring inspected and signed off.",
        material: None,
        equipment: &[],
        personnel: &["Priya Nair"],
        episode: "EP-1",
        status: LogStatus::Completed,
    },
    Seed {
        id: "seed-003",
        at: (6, 10, 15),
        location: "North Foundation",
        coords: (40.7411, -73.9898),
        category: "Structural",
        activity: "Rebar Placement",
        notes: "Rebar cages placed along the footing line.",
        material: Some("Rebar"),
        equipment: &["Crane"],
        personnel: &["Tom Reed", "Luis Ortega"],
        episode: "EP-1",
        status: LogStatus::InProgress,
    },
    Seed {
        id: "seed-004",
        at: (6, 14, 0),
        location: "Tower Crane Pad",
        coords: (40.7415, -73.9890),
        category: "Logistics",
        activity: "Delivery",
        notes: "Ready-mix delivery scheduled for tomorrow morning confirmed.",
        material: Some("Concrete"),
        equipment: &["Concrete Truck"],
        personnel: &["Maria Lopez"],
        episode: "EP-2",
        status: LogStatus::Planned,
    },
    Seed {
        id: "seed-005",
        at: (6, 15, 20),
        location: "Tower Crane Pad",
        coords: (40.7416, -73.9891),
        category: "Equipment",
        activity: "Maintenance",
        notes: "Crane hoist cable replaced after routine check.",
        material: None,
        equipment: &["Crane"],
        personnel: &["Luis Ortega"],
        episode: "EP-2",
        status: LogStatus::Completed,
    },
    Seed {
        id: "seed-006",
        at: (7, 7, 30),
        location: "North Foundation",
        coords: (40.7411, -73.9897),
        category: "Structural",
        activity: "Concrete Pour",
        notes: "Footing pour started; pump line primed.",
        material: Some("Concrete"),
        equipment: &["Concrete Pump", "Concrete Truck"],
        personnel: &["Tom Reed", "Maria Lopez"],
        episode: "EP-3",
        status: LogStatus::InProgress,
    },
    Seed {
        id: "seed-007",
        at: (7, 9, 10),
        location: "North Foundation",
        coords: (40.7412, -73.9897),
        category: "Quality",
        activity: "Slump Test",
        notes: "Slump test within tolerance on second truck.",
        material: Some("Concrete"),
        equipment: &[],
        personnel: &["Priya Nair"],
        episode: "EP-3",
        status: LogStatus::Completed,
    },
    Seed {
        id: "seed-008",
        at: (7, 11, 45),
        location: "East Scaffold",
        coords: (40.7409, -73.9885),
        category: "Safety",
        activity: "Inspection",
        notes: "Scaffold tag missing on level 2; access closed.",
        material: None,
        equipment: &["Scaffold"],
        personnel: &["Priya Nair"],
        episode: "EP-3",
        status: LogStatus::Delayed,
    },
    Seed {
        id: "seed-009",
        at: (8, 8, 0),
        location: "East Scaffold",
        coords: (40.7409, -73.9886),
        category: "Safety",
        activity: "Inspection",
        notes: "Scaffold re-tagged and reopened.",
        material: None,
        equipment: &["Scaffold"],
        personnel: &["Priya Nair", "Luis Ortega"],
        episode: "EP-4",
        status: LogStatus::Completed,
    },
    Seed {
        id: "seed-010",
        at: (8, 9, 30),
        location: "Tower Crane Pad",
        coords: (40.7415, -73.9890),
        category: "Structural",
        activity: "Steel Erection",
        notes: "First column set lifted; wind picked up so lifts paused.",
        material: Some("Steel"),
        equipment: &["Crane"],
        personnel: &["Luis Ortega", "Tom Reed"],
        episode: "EP-4",
        status: LogStatus::Delayed,
    },
    Seed {
        id: "seed-011",
        at: (8, 10, 50),
        location: "Site Office",
        coords: (40.7418, -73.9899),
        category: "Coordination",
        activity: "Meeting",
        notes: "Lookahead meeting moved the east wall formwork to next week.",
        material: None,
        equipment: &[],
        personnel: &["Maria Lopez", "Priya Nair"],
        episode: "EP-4",
        status: LogStatus::Completed,
    },
    Seed {
        id: "seed-012",
        at: (8, 13, 15),
        location: "East Scaffold",
        coords: (40.7408, -73.9885),
        category: "Structural",
        activity: "Formwork",
        notes: "Formwork for the east wall cancelled for this week.",
        material: Some("Timber"),
        equipment: &[],
        personnel: &["Tom Reed"],
        episode: "EP-4",
        status: LogStatus::Cancelled,
    },
];

fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, day, hour, minute, 0)
        .single()
        .unwrap_or_default()
}

/// Static sample records used when no records table is configured.
pub fn sample_logs() -> Vec<LogEntry> {
    SEEDS
        .iter()
        .enumerate()
        .map(|(i, s)| LogEntry {
            id: s.id.to_string(),
            timestamp: at(s.at.0, s.at.1, s.at.2),
            location: s.location.to_string(),
            category: s.category.to_string(),
            activity_type: s.activity.to_string(),
            notes: s.notes.to_string(),
            material: s.material.map(str::to_string),
            equipment: s.equipment.iter().map(|e| e.to_string()).collect(),
            personnel: s.personnel.iter().map(|p| p.to_string()).collect(),
            media_url: None,
            coordinates: Some(Coordinates {
                lat: s.coords.0,
                lng: s.coords.1,
            }),
            episode_id: Some(s.episode.to_string()),
            status: s.status,
            reference_id: format!("REF-{}", 1000 + i),
            video_title: Some(format!("Site walk 2024-05-{:02}", s.at.0)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_sample_ids_are_unique() {
        let logs = sample_logs();
        let ids: HashSet<_> = logs.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids.len(), logs.len());
    }

    #[test]
    fn test_sample_spans_several_episodes() {
        let logs = sample_logs();
        let episodes: HashSet<_> = logs.iter().filter_map(|l| l.episode_id.clone()).collect();
        assert_eq!(episodes.len(), 4);
        assert!(logs.iter().all(|l| l.timestamp.timestamp() > 0));
    }
}

use serde::Serialize;

use crate::models::log_entry::Coordinates;
use crate::models::LogEntry;
use crate::views::grouping::group_by_location;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapMarker {
    pub location: String,
    pub centroid: Coordinates,
    pub count: usize,
    pub log_ids: Vec<String>,
    pub latest_status: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapView {
    pub markers: Vec<MapMarker>,
    /// Records without coordinates.
    pub unplaced: usize,
}

/// One marker per location, placed at the mean of its records' coordinates.
pub fn build_map(entries: &[LogEntry]) -> MapView {
    let placed: Vec<LogEntry> = entries
        .iter()
        .filter(|e| e.coordinates.is_some())
        .cloned()
        .collect();
    let unplaced = entries.len() - placed.len();

    let markers = group_by_location(&placed)
        .into_iter()
        .filter_map(|group| {
            let coords: Vec<Coordinates> =
                group.entries.iter().filter_map(|e| e.coordinates).collect();
            let n = coords.len() as f64;
            if n == 0.0 {
                return None;
            }
            let centroid = Coordinates {
                lat: coords.iter().map(|c| c.lat).sum::<f64>() / n,
                lng: coords.iter().map(|c| c.lng).sum::<f64>() / n,
            };
            let latest = group.entries.iter().max_by_key(|e| e.timestamp)?;
            Some(MapMarker {
                latest_status: latest.status.to_string(),
                location: group.key,
                centroid,
                count: group.entries.len(),
                log_ids: group.entries.iter().map(|e| e.id.clone()).collect(),
            })
        })
        .collect();

    MapView { markers, unplaced }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::seed::sample_logs;

    #[test]
    fn test_markers_cover_placed_records() {
        let mut logs = sample_logs();
        logs[0].coordinates = None;
        let view = build_map(&logs);
        assert_eq!(view.unplaced, 1);
        let counted: usize = view.markers.iter().map(|m| m.count).sum();
        assert_eq!(counted, logs.len() - 1);
    }

    #[test]
    fn test_centroid_is_mean() {
        let logs = sample_logs();
        let view = build_map(&logs);
        let office = view
            .markers
            .iter()
            .find(|m| m.location == "Site Office")
            .unwrap();
        assert_eq!(office.count, 1);
        assert!((office.centroid.lat - 40.7418).abs() < 1e-9);
    }
}

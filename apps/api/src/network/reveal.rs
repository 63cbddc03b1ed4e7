use std::collections::HashSet;

use serde::Serialize;

use crate::models::LogEntry;
use crate::network::model::{log_node_id, Graph, NodeType};

pub const MAX_REVEAL_STEPS: usize = 12;

/// One frame of the growth animation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealStep {
    pub step: usize,
    pub node_ids: Vec<String>,
    pub link_ids: Vec<String>,
    /// Records visible so far, for the animation caption.
    pub log_count: usize,
}

/// Splits the graph into at most `MAX_REVEAL_STEPS` cumulative snapshots.
///
/// Logs are revealed in time order; each snapshot holds every log revealed so
/// far, the entities adjacent to them, and links with both endpoints visible.
/// Episode-to-episode and recurrence links appear once both ends are visible.
pub fn reveal_sequence(graph: &Graph, entries: &[LogEntry]) -> Vec<RevealStep> {
    let mut ordered: Vec<&LogEntry> = entries
        .iter()
        .filter(|e| graph.contains(&log_node_id(&e.id)))
        .collect();
    ordered.sort_by_key(|e| e.timestamp);
    let mut seen_logs = HashSet::new();
    ordered.retain(|e| seen_logs.insert(e.id.clone()));

    if ordered.is_empty() {
        return Vec::new();
    }

    let steps = ordered.len().min(MAX_REVEAL_STEPS);
    let mut visible: HashSet<String> = HashSet::new();
    let mut revealed = Vec::with_capacity(steps);
    let mut cursor = 0usize;

    for step in 0..steps {
        // Spread logs evenly: step k ends at ceil((k+1) * n / steps).
        let end = ((step + 1) * ordered.len()).div_ceil(steps);
        for entry in &ordered[cursor..end] {
            let log_id = log_node_id(&entry.id);
            for link in graph.links.iter().filter(|l| l.source == log_id) {
                visible.insert(link.target.clone());
            }
            visible.insert(log_id);
        }
        cursor = end;

        let node_ids: Vec<String> = graph
            .nodes
            .iter()
            .filter(|n| visible.contains(&n.id))
            .map(|n| n.id.clone())
            .collect();
        let link_ids: Vec<String> = graph
            .links
            .iter()
            .filter(|l| visible.contains(&l.source) && visible.contains(&l.target))
            .map(|l| l.id.clone())
            .collect();
        let mut frame = RevealStep {
            step: step + 1,
            node_ids,
            link_ids,
            log_count: 0,
        };
        frame.log_count = logs_in_step(graph, &frame);
        revealed.push(frame);
    }

    revealed
}

/// Log nodes visible at a step.
pub fn logs_in_step(graph: &Graph, step: &RevealStep) -> usize {
    step.node_ids
        .iter()
        .filter_map(|id| graph.node(id))
        .filter(|n| n.node_type == NodeType::Log)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::log_entry::{IngestDefaults, PartialLogEntry};
    use crate::network::builder::{build_graph, GraphOptions};
    use crate::records::seed::sample_logs;
    use chrono::{Duration, TimeZone, Utc};

    fn many(n: usize) -> Vec<LogEntry> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| {
                PartialLogEntry {
                    id: Some(format!("l{i}")),
                    timestamp: Some(base + Duration::minutes(i as i64 * 30)),
                    location: Some(format!("Zone {}", i % 3)),
                    ..Default::default()
                }
                .into_entry(&IngestDefaults::default(), base)
            })
            .collect()
    }

    #[test]
    fn test_step_count_is_capped() {
        let entries = many(40);
        let graph = build_graph(&entries, &GraphOptions::default());
        let steps = reveal_sequence(&graph, &entries);
        assert_eq!(steps.len(), MAX_REVEAL_STEPS);
        assert_eq!(logs_in_step(&graph, steps.last().unwrap()), 40);
        assert_eq!(steps.last().unwrap().log_count, 40);
    }

    #[test]
    fn test_small_input_one_log_per_step() {
        let entries = many(5);
        let graph = build_graph(&entries, &GraphOptions::default());
        let steps = reveal_sequence(&graph, &entries);
        assert_eq!(steps.len(), 5);
        for (i, step) in steps.iter().enumerate() {
            assert_eq!(logs_in_step(&graph, step), i + 1);
            assert_eq!(step.log_count, i + 1);
        }
    }

    #[test]
    fn test_steps_are_monotonic_and_closed() {
        let entries = sample_logs();
        let graph = build_graph(&entries, &GraphOptions::default());
        let steps = reveal_sequence(&graph, &entries);
        for pair in steps.windows(2) {
            let earlier: HashSet<_> = pair[0].node_ids.iter().collect();
            assert!(pair[1].node_ids.iter().filter(|id| earlier.contains(id)).count() == earlier.len());
            assert!(pair[1].link_ids.len() >= pair[0].link_ids.len());
        }
        for step in &steps {
            let nodes: HashSet<_> = step.node_ids.iter().collect();
            for link in graph.links.iter().filter(|l| step.link_ids.contains(&l.id)) {
                assert!(nodes.contains(&link.source) && nodes.contains(&link.target));
            }
        }
        assert_eq!(steps.last().unwrap().node_ids.len(), graph.nodes.len());
    }

    #[test]
    fn test_empty_graph_has_no_steps() {
        assert!(reveal_sequence(&Graph::default(), &[]).is_empty());
    }
}

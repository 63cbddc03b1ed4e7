//! Graph construction: LogEntry records → typed entity/episode node and link sets.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::models::LogEntry;
use crate::network::model::{
    entity_id, log_node_id, Graph, GraphLink, GraphNode, LinkType, NodeType,
};
use crate::views::grouping::episode_keys;

#[derive(Debug, Clone)]
pub struct GraphOptions {
    /// Gap used to derive episodes for records without an `episode_id`.
    pub episode_gap_minutes: i64,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            episode_gap_minutes: 120,
        }
    }
}

/// Accumulates nodes and links while keeping first-seen order.
#[derive(Default)]
struct GraphAccumulator {
    nodes: Vec<GraphNode>,
    node_index: HashMap<String, usize>,
    links: Vec<GraphLink>,
    link_index: HashMap<String, usize>,
}

impl GraphAccumulator {
    fn entity(&mut self, node_type: NodeType, value: &str) -> String {
        let id = entity_id(node_type, value);
        let slot = match self.node_index.get(&id) {
            Some(&slot) => slot,
            None => {
                self.nodes
                    .push(GraphNode::new(id.clone(), value.trim().to_string(), node_type));
                self.node_index.insert(id.clone(), self.nodes.len() - 1);
                self.nodes.len() - 1
            }
        };
        self.nodes[slot].count += 1;
        id
    }

    fn log(&mut self, entry: &LogEntry) -> String {
        let id = log_node_id(&entry.id);
        if !self.node_index.contains_key(&id) {
            let label = format!("{} @ {}", entry.activity_type, entry.timestamp.format("%H:%M"));
            let mut node = GraphNode::new(id.clone(), label, NodeType::Log);
            node.count = 1;
            node.log_id = Some(entry.id.clone());
            self.nodes.push(node);
            self.node_index.insert(id.clone(), self.nodes.len() - 1);
        }
        id
    }

    fn link(&mut self, source: &str, target: &str, link_type: LinkType, value: u32) {
        let link = GraphLink::new(source, target, link_type, value);
        match self.link_index.get(&link.id) {
            Some(&slot) => self.links[slot].value += value,
            None => {
                self.link_index.insert(link.id.clone(), self.links.len());
                self.links.push(link);
            }
        }
    }
}

/// Builds the entity/episode graph for a set of records.
///
/// Every record yields one log node linked to each populated entity
/// (location, activity, material, equipment, personnel, category, status,
/// day, episode). Episodes are chained chronologically with `followed_by`,
/// and entities seen in two or more episodes get `recurs_in` links to each.
pub fn build_graph(entries: &[LogEntry], options: &GraphOptions) -> Graph {
    let mut acc = GraphAccumulator::default();
    let episodes = episode_keys(entries, options.episode_gap_minutes);

    let mut episode_start: BTreeMap<String, DateTime<Utc>> = BTreeMap::new();
    // entity id -> episode id -> occurrences
    let mut recurrence: BTreeMap<String, BTreeMap<String, u32>> = BTreeMap::new();

    for (entry, episode) in entries.iter().zip(episodes.iter()) {
        let log_id = acc.log(entry);

        let mut related: Vec<(NodeType, String)> = vec![
            (NodeType::Location, entry.location.clone()),
            (NodeType::Activity, entry.activity_type.clone()),
            (NodeType::Category, entry.category.clone()),
            (NodeType::Status, entry.status.to_string()),
            (NodeType::Date, entry.timestamp.format("%Y-%m-%d").to_string()),
        ];
        if let Some(material) = &entry.material {
            related.push((NodeType::Material, material.clone()));
        }
        related.extend(entry.equipment.iter().map(|e| (NodeType::Equipment, e.clone())));
        related.extend(entry.personnel.iter().map(|p| (NodeType::Personnel, p.clone())));
        if !episode.is_empty() {
            related.push((NodeType::Episode, episode.clone()));
        }

        let mut seen_here: HashSet<String> = HashSet::new();
        for (node_type, value) in related {
            if value.trim().is_empty() {
                continue;
            }
            let Some(link_type) = LinkType::for_entity(node_type) else {
                continue;
            };
            let target = entity_id(node_type, &value);
            if !seen_here.insert(target.clone()) {
                continue;
            }
            let target = acc.entity(node_type, &value);
            acc.link(&log_id, &target, link_type, 1);

            if node_type.tracks_recurrence() && !episode.is_empty() {
                let episode_node = entity_id(NodeType::Episode, episode);
                *recurrence
                    .entry(target)
                    .or_default()
                    .entry(episode_node)
                    .or_insert(0) += 1;
            }
        }

        if !episode.is_empty() {
            let start = episode_start
                .entry(entity_id(NodeType::Episode, episode))
                .or_insert(entry.timestamp);
            if entry.timestamp < *start {
                *start = entry.timestamp;
            }
        }
    }

    let mut chronological: Vec<(&String, &DateTime<Utc>)> = episode_start.iter().collect();
    chronological.sort_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(b.0)));
    for pair in chronological.windows(2) {
        acc.link(pair[0].0, pair[1].0, LinkType::FollowedBy, 1);
    }

    for (entity, per_episode) in &recurrence {
        if per_episode.len() < 2 {
            continue;
        }
        for (episode, count) in per_episode {
            acc.link(entity, episode, LinkType::RecursIn, *count);
        }
    }

    let graph = Graph {
        nodes: acc.nodes,
        links: acc.links,
    };
    let graph = retain_valid_links(graph);
    debug!(
        nodes = graph.nodes.len(),
        links = graph.links.len(),
        records = entries.len(),
        "Built network graph"
    );
    graph
}

/// Drops links whose source or target is not in the node set.
pub fn retain_valid_links(mut graph: Graph) -> Graph {
    let ids: BTreeSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
    let before = graph.links.len();
    let links = std::mem::take(&mut graph.links);
    let kept: Vec<GraphLink> = links
        .into_iter()
        .filter(|l| ids.contains(l.source.as_str()) && ids.contains(l.target.as_str()))
        .collect();
    let dropped = before - kept.len();
    if dropped > 0 {
        warn!(dropped, "Dropped links with missing endpoints");
    }
    graph.links = kept;
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::log_entry::{IngestDefaults, PartialLogEntry};
    use crate::records::seed::sample_logs;
    use chrono::TimeZone;

    fn entry(id: &str, day: u32, hour: u32, location: &str, equipment: &[&str]) -> LogEntry {
        PartialLogEntry {
            id: Some(id.to_string()),
            timestamp: Utc.with_ymd_and_hms(2024, 4, day, hour, 0, 0).single(),
            location: Some(location.to_string()),
            activity_type: Some("Inspection".to_string()),
            equipment: equipment.iter().map(|e| e.to_string()).collect(),
            ..Default::default()
        }
        .into_entry(&IngestDefaults::default(), Utc::now())
    }

    fn assert_no_dangling(graph: &Graph) {
        for link in &graph.links {
            assert!(graph.contains(&link.source), "missing source {}", link.source);
            assert!(graph.contains(&link.target), "missing target {}", link.target);
        }
    }

    #[test]
    fn test_seed_graph_has_no_dangling_links() {
        let graph = build_graph(&sample_logs(), &GraphOptions::default());
        assert_no_dangling(&graph);
        assert!(!graph.links.is_empty());
    }

    #[test]
    fn test_generated_inputs_have_no_dangling_links() {
        for n in 0..25u32 {
            let entries: Vec<LogEntry> = (0..n)
                .map(|i| {
                    let loc = ["Pad", "pad ", "Office", ""][(i % 4) as usize];
                    let eq: &[&str] = if i % 3 == 0 { &["Crane", "crane"] } else { &[] };
                    entry(&format!("e{i}"), 1 + i % 5, (i * 7) % 24, loc, eq)
                })
                .collect();
            let graph = build_graph(&entries, &GraphOptions::default());
            assert_no_dangling(&graph);
            let logs = graph.nodes.iter().filter(|n| n.node_type == NodeType::Log).count();
            assert_eq!(logs, n as usize);
        }
    }

    #[test]
    fn test_entities_are_deduplicated_case_insensitively() {
        let entries = vec![
            entry("a", 1, 8, "Crane Pad", &["Crane"]),
            entry("b", 1, 9, "crane pad ", &["CRANE"]),
        ];
        let graph = build_graph(&entries, &GraphOptions::default());
        let locations: Vec<_> = graph
            .nodes
            .iter()
            .filter(|n| n.node_type == NodeType::Location)
            .collect();
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].label, "Crane Pad");
        assert_eq!(locations[0].count, 2);
        let equipment = graph.node("equipment:crane").expect("equipment node");
        assert_eq!(equipment.count, 2);
    }

    #[test]
    fn test_log_links_are_typed() {
        let entries = vec![entry("a", 1, 8, "Pad", &["Crane"])];
        let graph = build_graph(&entries, &GraphOptions::default());
        let types: BTreeSet<LinkType> = graph
            .links
            .iter()
            .filter(|l| l.source == "log:a")
            .map(|l| l.link_type)
            .collect();
        for expected in [
            LinkType::At,
            LinkType::Is,
            LinkType::With,
            LinkType::CategorizedAs,
            LinkType::HasStatus,
            LinkType::OccurredOn,
            LinkType::PartOf,
        ] {
            assert!(types.contains(&expected), "missing {expected:?}");
        }
        assert!(!types.contains(&LinkType::Uses));
        assert!(!types.contains(&LinkType::By));
    }

    #[test]
    fn test_episodes_are_chained_chronologically() {
        let graph = build_graph(&sample_logs(), &GraphOptions::default());
        let chain: Vec<(&str, &str)> = graph
            .links
            .iter()
            .filter(|l| l.link_type == LinkType::FollowedBy)
            .map(|l| (l.source.as_str(), l.target.as_str()))
            .collect();
        assert_eq!(
            chain,
            vec![
                ("episode:ep-1", "episode:ep-2"),
                ("episode:ep-2", "episode:ep-3"),
                ("episode:ep-3", "episode:ep-4"),
            ]
        );
    }

    #[test]
    fn test_recurring_entities_link_to_each_episode() {
        let entries = vec![
            entry("a", 1, 8, "Pad", &["Crane"]),
            entry("b", 3, 8, "Office", &["Crane"]),
        ];
        let graph = build_graph(&entries, &GraphOptions::default());
        let recurs: Vec<_> = graph
            .links
            .iter()
            .filter(|l| l.link_type == LinkType::RecursIn && l.source == "equipment:crane")
            .collect();
        assert_eq!(recurs.len(), 2);
        assert!(graph
            .links
            .iter()
            .all(|l| !(l.link_type == LinkType::RecursIn && l.source == "location:pad")));
    }

    #[test]
    fn test_dangling_links_are_dropped() {
        let graph = Graph {
            nodes: vec![GraphNode::new("a".into(), "A".into(), NodeType::Location)],
            links: vec![
                GraphLink::new("a", "a", LinkType::At, 1),
                GraphLink::new("a", "ghost", LinkType::At, 1),
            ],
        };
        let graph = retain_valid_links(graph);
        assert_eq!(graph.links.len(), 1);
    }

    #[test]
    fn test_empty_input_gives_empty_graph() {
        let graph = build_graph(&[], &GraphOptions::default());
        assert!(graph.nodes.is_empty());
        assert!(graph.links.is_empty());
    }
}

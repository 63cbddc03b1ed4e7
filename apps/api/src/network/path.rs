//! Connection queries over the visible link set: BFS shortest path and
//! neighbourhood highlighting.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;

use crate::network::model::GraphLink;

/// Undirected adjacency list. Neighbour order follows link order, which makes
/// "first shortest path" deterministic.
fn adjacency(links: &[GraphLink]) -> HashMap<&str, Vec<&str>> {
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for link in links {
        adjacency
            .entry(link.source.as_str())
            .or_default()
            .push(link.target.as_str());
        adjacency
            .entry(link.target.as_str())
            .or_default()
            .push(link.source.as_str());
    }
    adjacency
}

/// Breadth-first search from `source` to `target`. Returns the node ids along
/// the first shortest path found, or `None` when no path exists.
pub fn shortest_path(links: &[GraphLink], source: &str, target: &str) -> Option<Vec<String>> {
    let adjacency = adjacency(links);
    if !adjacency.contains_key(source) || !adjacency.contains_key(target) {
        return None;
    }
    if source == target {
        return Some(vec![source.to_string()]);
    }

    let mut parent: HashMap<&str, &str> = HashMap::new();
    let mut visited: HashSet<&str> = HashSet::from([source]);
    let mut queue: VecDeque<&str> = VecDeque::from([source]);

    while let Some(node) = queue.pop_front() {
        if node == target {
            break;
        }
        for &next in adjacency.get(node).map(Vec::as_slice).unwrap_or_default() {
            if visited.insert(next) {
                parent.insert(next, node);
                queue.push_back(next);
            }
        }
    }

    if !visited.contains(target) {
        return None;
    }

    let mut path = vec![target.to_string()];
    let mut cursor = target;
    while let Some(&prev) = parent.get(cursor) {
        path.push(prev.to_string());
        cursor = prev;
    }
    path.reverse();
    Some(path)
}

/// Ids of links joining consecutive nodes of `path`, in either direction.
pub fn path_links(path: &[String], links: &[GraphLink]) -> Vec<String> {
    path.windows(2)
        .filter_map(|pair| {
            links
                .iter()
                .find(|l| {
                    (l.source == pair[0] && l.target == pair[1])
                        || (l.source == pair[1] && l.target == pair[0])
                })
                .map(|l| l.id.clone())
        })
        .collect()
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    pub node_ids: Vec<String>,
    pub link_ids: Vec<String>,
}

/// The selected node, its direct neighbours, and the links between them.
pub fn neighborhood(links: &[GraphLink], id: &str) -> Highlight {
    let mut nodes: Vec<String> = vec![id.to_string()];
    let mut seen: HashSet<&str> = HashSet::from([id]);
    let mut link_ids = Vec::new();
    for link in links {
        let other = if link.source == id {
            link.target.as_str()
        } else if link.target == id {
            link.source.as_str()
        } else {
            continue;
        };
        link_ids.push(link.id.clone());
        if seen.insert(other) {
            nodes.push(other.to_string());
        }
    }
    if link_ids.is_empty() {
        return Highlight::default();
    }
    Highlight {
        node_ids: nodes,
        link_ids,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::model::LinkType;

    fn link(a: &str, b: &str) -> GraphLink {
        GraphLink::new(a, b, LinkType::At, 1)
    }

    fn chain() -> Vec<GraphLink> {
        vec![link("A", "B"), link("B", "C"), link("C", "D")]
    }

    #[test]
    fn test_path_along_chain() {
        assert_eq!(
            shortest_path(&chain(), "A", "D"),
            Some(vec!["A".into(), "B".into(), "C".into(), "D".into()])
        );
    }

    #[test]
    fn test_path_ignores_direction() {
        assert_eq!(
            shortest_path(&chain(), "D", "A"),
            Some(vec!["D".into(), "C".into(), "B".into(), "A".into()])
        );
    }

    #[test]
    fn test_disconnected_node_has_no_path() {
        let mut links = chain();
        links.push(link("Z", "Y"));
        assert_eq!(shortest_path(&links, "A", "Z"), None);
        assert_eq!(shortest_path(&chain(), "A", "Z"), None);
    }

    #[test]
    fn test_prefers_shortest_route() {
        let mut links = chain();
        links.push(link("A", "D"));
        assert_eq!(shortest_path(&links, "A", "D"), Some(vec!["A".into(), "D".into()]));
    }

    #[test]
    fn test_same_node() {
        assert_eq!(shortest_path(&chain(), "B", "B"), Some(vec!["B".into()]));
    }

    #[test]
    fn test_path_links_follow_path() {
        let links = chain();
        let path = shortest_path(&links, "D", "B").unwrap();
        let ids = path_links(&path, &links);
        assert_eq!(ids, vec!["C->D:at".to_string(), "B->C:at".to_string()]);
    }

    #[test]
    fn test_neighborhood() {
        let highlight = neighborhood(&chain(), "B");
        assert_eq!(highlight.node_ids, vec!["B", "A", "C"]);
        assert_eq!(highlight.link_ids.len(), 2);
        assert!(neighborhood(&chain(), "Q").node_ids.is_empty());
    }
}

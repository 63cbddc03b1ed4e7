use serde::{Deserialize, Serialize};

/// What a graph node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Log,
    Location,
    Activity,
    Material,
    Equipment,
    Personnel,
    Category,
    Status,
    Date,
    Episode,
}

impl NodeType {
    pub fn key(self) -> &'static str {
        match self {
            NodeType::Log => "log",
            NodeType::Location => "location",
            NodeType::Activity => "activity",
            NodeType::Material => "material",
            NodeType::Equipment => "equipment",
            NodeType::Personnel => "personnel",
            NodeType::Category => "category",
            NodeType::Status => "status",
            NodeType::Date => "date",
            NodeType::Episode => "episode",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            NodeType::Log => "file-text",
            NodeType::Location => "map-pin",
            NodeType::Activity => "activity",
            NodeType::Material => "package",
            NodeType::Equipment => "truck",
            NodeType::Personnel => "user",
            NodeType::Category => "tag",
            NodeType::Status => "check-circle",
            NodeType::Date => "calendar",
            NodeType::Episode => "film",
        }
    }

    /// Visual radius in pixels; the collision force uses the same value.
    pub fn radius(self) -> f64 {
        match self {
            NodeType::Episode => 22.0,
            NodeType::Location => 16.0,
            NodeType::Log => 7.0,
            NodeType::Date | NodeType::Status => 10.0,
            _ => 12.0,
        }
    }

    /// Many-body strength; structurally important types push harder.
    pub fn charge(self) -> f64 {
        match self {
            NodeType::Episode => -600.0,
            NodeType::Location => -350.0,
            NodeType::Activity => -250.0,
            NodeType::Date | NodeType::Status => -150.0,
            NodeType::Log => -100.0,
            _ => -200.0,
        }
    }

    /// Entities whose recurrence across episodes gets a `recurs_in` link.
    pub fn tracks_recurrence(self) -> bool {
        matches!(
            self,
            NodeType::Location
                | NodeType::Activity
                | NodeType::Material
                | NodeType::Equipment
                | NodeType::Personnel
        )
    }
}

/// Typed relationship between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    At,
    Is,
    Uses,
    With,
    By,
    CategorizedAs,
    HasStatus,
    OccurredOn,
    PartOf,
    FollowedBy,
    RecursIn,
}

impl LinkType {
    pub fn key(self) -> &'static str {
        match self {
            LinkType::At => "at",
            LinkType::Is => "is",
            LinkType::Uses => "uses",
            LinkType::With => "with",
            LinkType::By => "by",
            LinkType::CategorizedAs => "categorized_as",
            LinkType::HasStatus => "has_status",
            LinkType::OccurredOn => "occurred_on",
            LinkType::PartOf => "part_of",
            LinkType::FollowedBy => "followed_by",
            LinkType::RecursIn => "recurs_in",
        }
    }

    /// The link emitted from a log node to an entity of the given type.
    pub fn for_entity(node_type: NodeType) -> Option<LinkType> {
        Some(match node_type {
            NodeType::Location => LinkType::At,
            NodeType::Activity => LinkType::Is,
            NodeType::Material => LinkType::Uses,
            NodeType::Equipment => LinkType::With,
            NodeType::Personnel => LinkType::By,
            NodeType::Category => LinkType::CategorizedAs,
            NodeType::Status => LinkType::HasStatus,
            NodeType::Date => LinkType::OccurredOn,
            NodeType::Episode => LinkType::PartOf,
            NodeType::Log => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub node_type: NodeType,
    pub icon: String,
    pub radius: f64,
    /// Number of log records that reference this node (1 for log nodes).
    pub count: usize,
    /// Source record id, set on log nodes only.
    pub log_id: Option<String>,
}

impl GraphNode {
    pub fn new(id: String, label: String, node_type: NodeType) -> Self {
        Self {
            id,
            label,
            node_type,
            icon: node_type.icon().to_string(),
            radius: node_type.radius(),
            count: 0,
            log_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphLink {
    pub id: String,
    pub source: String,
    pub target: String,
    pub link_type: LinkType,
    /// Times the relationship was observed.
    pub value: u32,
}

impl GraphLink {
    pub fn new(source: &str, target: &str, link_type: LinkType, value: u32) -> Self {
        Self {
            id: format!("{source}->{target}:{}", link_type.key()),
            source: source.to_string(),
            target: target.to_string(),
            link_type,
            value,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

impl Graph {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }
}

/// Node id for an entity value: `<type>:<lowercased trimmed value>`.
pub fn entity_id(node_type: NodeType, value: &str) -> String {
    format!("{}:{}", node_type.key(), value.trim().to_lowercase())
}

pub fn log_node_id(log_id: &str) -> String {
    format!("log:{log_id}")
}

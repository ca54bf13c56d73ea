//! The branching scene graph.
//!
//! Nodes reference their successors by id. A node never owns the nodes it
//! connects to, so the graph is a flat list plus id edges, validated once
//! on construction.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::character::Position;
use crate::error::{CoreError, CoreResult};
use crate::id::NodeId;

/// What kind of place a node is. Also used as the category tag of a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Where the expedition begins.
    Start,
    /// A fight is likely.
    Combat,
    /// Something happens.
    Event,
    /// The boss lair.
    Boss,
    /// A place to rest.
    Safe,
}

impl NodeKind {
    /// Parse a kind from its tag.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "start" => Some(Self::Start),
            "combat" => Some(Self::Combat),
            "event" => Some(Self::Event),
            "boss" => Some(Self::Boss),
            "safe" => Some(Self::Safe),
            _ => None,
        }
    }

    /// Map icon.
    pub fn icon(self) -> &'static str {
        match self {
            Self::Start => "🚪",
            Self::Combat => "⚔️",
            Self::Event => "❓",
            Self::Boss => "👹",
            Self::Safe => "🏕️",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Combat => write!(f, "combat"),
            Self::Event => write!(f, "event"),
            Self::Boss => write!(f, "boss"),
            Self::Safe => write!(f, "safe"),
        }
    }
}

/// A location on the dungeon map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneNode {
    /// Unique id.
    pub id: NodeId,
    /// Display name.
    pub name: String,
    /// Kind of place.
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Layout position on the map.
    pub position: Position,
    /// Nodes reachable from here.
    #[serde(default)]
    pub connected_to: BTreeSet<NodeId>,
}

impl SceneNode {
    /// Create a node with no outgoing edges.
    pub fn new(id: impl Into<NodeId>, name: impl Into<String>, kind: NodeKind, x: i32, y: i32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            position: Position::new(x, y),
            connected_to: BTreeSet::new(),
        }
    }

    /// Add an outgoing edge.
    pub fn connect(mut self, to: impl Into<NodeId>) -> Self {
        self.connected_to.insert(to.into());
        self
    }
}

/// The full map: nodes with unique ids and edges that point at existing nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SceneNode>", into = "Vec<SceneNode>")]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
}

impl SceneGraph {
    /// Build a graph. There must be exactly one start node, ids must be
    /// unique, and every edge must point at a node in the graph.
    pub fn new(nodes: Vec<SceneNode>) -> CoreResult<Self> {
        let mut seen = HashSet::new();
        for node in &nodes {
            if !seen.insert(&node.id) {
                return Err(CoreError::InvalidGraph(format!(
                    "duplicate node id \"{}\"",
                    node.id
                )));
            }
        }
        for node in &nodes {
            if let Some(missing) = node.connected_to.iter().find(|t| !seen.contains(t)) {
                return Err(CoreError::InvalidGraph(format!(
                    "node \"{}\" connects to unknown node \"{missing}\"",
                    node.id
                )));
            }
        }
        let starts = nodes.iter().filter(|n| n.kind == NodeKind::Start).count();
        if starts != 1 {
            return Err(CoreError::InvalidGraph(format!(
                "expected exactly one start node, found {starts}"
            )));
        }
        Ok(Self { nodes })
    }

    /// The unique start node.
    pub fn start(&self) -> &SceneNode {
        // `new` guarantees exactly one start node.
        self.nodes
            .iter()
            .find(|n| n.kind == NodeKind::Start)
            .unwrap_or(&self.nodes[0])
    }

    /// Look up a node.
    pub fn get(&self, id: &NodeId) -> Option<&SceneNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// Whether a node exists.
    pub fn contains(&self, id: &NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Whether `to` is directly reachable from `from`.
    pub fn is_adjacent(&self, from: &NodeId, to: &NodeId) -> bool {
        self.get(from)
            .is_some_and(|n| n.connected_to.contains(to))
    }

    /// Nodes reachable from `id`, in id order.
    pub fn neighbors(&self, id: &NodeId) -> Vec<&SceneNode> {
        self.get(id)
            .map(|n| n.connected_to.iter().filter_map(|t| self.get(t)).collect())
            .unwrap_or_default()
    }

    /// All nodes.
    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }
}

impl TryFrom<Vec<SceneNode>> for SceneGraph {
    type Error = CoreError;

    fn try_from(nodes: Vec<SceneNode>) -> CoreResult<Self> {
        Self::new(nodes)
    }
}

impl From<SceneGraph> for Vec<SceneNode> {
    fn from(graph: SceneGraph) -> Self {
        graph.nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_graph() -> SceneGraph {
        SceneGraph::new(vec![
            SceneNode::new("start", "入口", NodeKind::Start, 0, 0).connect("hall"),
            SceneNode::new("hall", "大厅", NodeKind::Event, 1, 0).connect("lair"),
            SceneNode::new("lair", "巢穴", NodeKind::Boss, 2, 0),
        ])
        .unwrap()
    }

    #[test]
    fn start_and_lookup() {
        let g = small_graph();
        assert_eq!(g.start().id, NodeId::new("start"));
        assert!(g.contains(&NodeId::new("lair")));
        assert!(!g.contains(&NodeId::new("attic")));
    }

    #[test]
    fn adjacency_is_directional() {
        let g = small_graph();
        assert!(g.is_adjacent(&NodeId::new("start"), &NodeId::new("hall")));
        assert!(!g.is_adjacent(&NodeId::new("hall"), &NodeId::new("start")));
        let names: Vec<&str> = g
            .neighbors(&NodeId::new("hall"))
            .iter()
            .map(|n| n.name.as_str())
            .collect();
        assert_eq!(names, vec!["巢穴"]);
    }

    #[test]
    fn rejects_dangling_edge() {
        let err = SceneGraph::new(vec![
            SceneNode::new("start", "入口", NodeKind::Start, 0, 0).connect("nowhere"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("nowhere"));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = SceneGraph::new(vec![
            SceneNode::new("start", "入口", NodeKind::Start, 0, 0),
            SceneNode::new("start", "又一个入口", NodeKind::Event, 1, 0),
        ])
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidGraph(_)));
    }

    #[test]
    fn requires_single_start() {
        assert!(SceneGraph::new(vec![SceneNode::new("a", "A", NodeKind::Event, 0, 0)]).is_err());
    }

    #[test]
    fn serde_validates_on_load() {
        let json = serde_json::to_string(&small_graph()).unwrap();
        let back: SceneGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(back, small_graph());

        let broken = r#"[{"id":"a","name":"A","type":"event","position":{"x":0,"y":0}}]"#;
        assert!(serde_json::from_str::<SceneGraph>(broken).is_err());
    }
}

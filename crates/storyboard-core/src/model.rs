use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub String);

impl NodeId {
    pub fn generate() -> Self {
        NodeId(uuid::Uuid::new_v4().to_string())
    }
}

impl EdgeId {
    pub fn generate() -> Self {
        EdgeId(uuid::Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generate `as_str()` and `from_str()` for an enum with camelCase wire names.
macro_rules! str_enum {
    ($T:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        impl $T {
            pub fn as_str(&self) -> &'static str {
                match self { $( $T::$variant => $s, )+ }
            }
            #[allow(clippy::should_implement_trait)]
            pub fn from_str(s: &str) -> Option<$T> {
                match s { $( $s => Some($T::$variant), )+ _ => None }
            }
        }
        impl std::fmt::Display for $T {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use str_enum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeType {
    Character,
    WorldNote,
    PlotEvent,
    Chapter,
    Free,
}

str_enum!(NodeType {
    Character => "character",
    WorldNote => "worldNote",
    PlotEvent => "plotEvent",
    Chapter => "chapter",
    Free => "free",
});

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Position {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Pan/zoom state of the board's visual frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

/// Everything about a node the writer edits. Part of the structural signature.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Back-reference to the external entity this node was imported from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    /// Character nodes only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// World-note nodes only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl NodeData {
    pub fn labeled(label: impl Into<String>) -> Self {
        NodeData {
            label: label.into(),
            ..NodeData::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub position: Position,
    pub data: NodeData,
    /// View-layer selection. Never serialized, snapshotted or signed.
    #[serde(skip)]
    pub selected: bool,
}

impl Node {
    /// Copy with every view-layer flag dropped.
    pub fn detached(&self) -> Node {
        Node {
            selected: false,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: EdgeId,
    pub source_node_id: NodeId,
    pub target_node_id: NodeId,
    #[serde(default)]
    pub label: String,
}

impl Edge {
    pub fn touches(&self, node_id: &NodeId) -> bool {
        &self.source_node_id == node_id || &self.target_node_id == node_id
    }
}

/// Input for [`GraphDocument::add_node`]; the id is generated.
#[derive(Debug, Clone)]
pub struct NewNode {
    pub node_type: NodeType,
    pub position: Position,
    pub data: NodeData,
}

impl NewNode {
    pub fn new(node_type: NodeType, position: Position) -> Self {
        NewNode {
            node_type,
            position,
            data: NodeData::default(),
        }
    }

    pub fn with_data(mut self, data: NodeData) -> Self {
        self.data = data;
        self
    }
}

/// Partial update for a node. For optional fields, `Some(None)` clears the value.
#[derive(Debug, Clone, Default)]
pub struct NodePatch {
    pub label: Option<String>,
    pub description: Option<Option<String>>,
    pub color: Option<Option<String>>,
    pub role: Option<Option<String>>,
    pub category: Option<Option<String>>,
    pub position: Option<Position>,
}

/// The live board of one work-document.
#[derive(Debug, Clone, Default)]
pub struct GraphDocument {
    pub nodes: HashMap<NodeId, Node>,
    pub edges: HashMap<EdgeId, Edge>,
    pub viewport: Viewport,
}

impl GraphDocument {
    pub fn new() -> Self {
        GraphDocument::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Detached nodes ordered by id.
    pub fn sorted_nodes(&self) -> Vec<Node> {
        let mut nodes: Vec<Node> = self.nodes.values().map(Node::detached).collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes
    }

    /// Edges ordered by id.
    pub fn sorted_edges(&self) -> Vec<Edge> {
        let mut edges: Vec<Edge> = self.edges.values().cloned().collect();
        edges.sort_by(|a, b| a.id.cmp(&b.id));
        edges
    }
}

/// Immutable, selection-free copy of a board's nodes and edges. History only.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl Snapshot {
    pub fn capture(doc: &GraphDocument) -> Self {
        Snapshot {
            nodes: doc.sorted_nodes(),
            edges: doc.sorted_edges(),
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Replace the document's nodes and edges with this snapshot. The viewport is untouched.
    pub fn restore_into(&self, doc: &mut GraphDocument) {
        doc.nodes = self
            .nodes
            .iter()
            .map(|n| (n.id.clone(), n.clone()))
            .collect();
        doc.edges = self
            .edges
            .iter()
            .map(|e| (e.id.clone(), e.clone()))
            .collect();
    }
}

/// Storage and export wire shape of a board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardPayload {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl BoardPayload {
    pub fn from_document(doc: &GraphDocument) -> Self {
        BoardPayload {
            nodes: doc.sorted_nodes(),
            edges: doc.sorted_edges(),
            viewport: doc.viewport,
            saved_at: None,
        }
    }

    pub fn stamped(mut self) -> Self {
        self.saved_at = Some(Utc::now());
        self
    }

    /// Build a document from the payload, dropping edges whose endpoints are missing.
    pub fn into_document(self) -> GraphDocument {
        let mut doc = GraphDocument {
            viewport: self.viewport,
            ..GraphDocument::default()
        };
        doc.replace_contents(self.nodes, self.edges);
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, x: f64) -> Node {
        Node {
            id: NodeId(id.to_string()),
            node_type: NodeType::Free,
            position: Position::new(x, 0.0),
            data: NodeData::labeled(id),
            selected: true,
        }
    }

    #[test]
    fn test_node_type_wire_names() {
        assert_eq!(NodeType::WorldNote.as_str(), "worldNote");
        assert_eq!(NodeType::from_str("plotEvent"), Some(NodeType::PlotEvent));
        assert_eq!(NodeType::from_str("plot_event"), None);
        let json = serde_json::to_string(&NodeType::WorldNote).unwrap();
        assert_eq!(json, "\"worldNote\"");
    }

    #[test]
    fn test_node_serializes_without_selection() {
        let n = node("a", 1.0);
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "free");
        assert_eq!(json["data"]["label"], "a");
        assert!(json.get("selected").is_none());
        assert!(json["data"].get("sourceId").is_none());

        let back: Node = serde_json::from_value(json).unwrap();
        assert!(!back.selected);
    }

    #[test]
    fn test_edge_wire_names() {
        let e = Edge {
            id: EdgeId("e1".to_string()),
            source_node_id: NodeId("a".to_string()),
            target_node_id: NodeId("b".to_string()),
            label: String::new(),
        };
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["sourceNodeId"], "a");
        assert_eq!(json["targetNodeId"], "b");
    }

    #[test]
    fn test_snapshot_is_sorted_and_detached() {
        let mut doc = GraphDocument::new();
        for (id, x) in [("b", 2.0), ("a", 1.0)] {
            let n = node(id, x);
            doc.nodes.insert(n.id.clone(), n);
        }
        let snap = Snapshot::capture(&doc);
        assert_eq!(snap.nodes()[0].id.0, "a");
        assert!(snap.nodes().iter().all(|n| !n.selected));

        let mut other = GraphDocument::new();
        snap.restore_into(&mut other);
        assert_eq!(other.nodes.len(), 2);
    }

    #[test]
    fn test_viewport_defaults_when_missing() {
        let payload: BoardPayload =
            serde_json::from_str(r#"{"nodes": [], "edges": []}"#).unwrap();
        assert_eq!(payload.viewport, Viewport::default());
        assert_eq!(payload.viewport.zoom, 1.0);
    }
}

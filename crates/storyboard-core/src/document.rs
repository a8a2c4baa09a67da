use crate::error::BoardError;
use crate::model::*;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Mutation primitives. Each one either succeeds completely or leaves the
/// document untouched.
impl GraphDocument {
    pub fn node(&self, node_id: &NodeId) -> Result<&Node, BoardError> {
        self.nodes
            .get(node_id)
            .ok_or_else(|| BoardError::NodeNotFound(node_id.0.clone()))
    }

    pub fn edge(&self, edge_id: &EdgeId) -> Result<&Edge, BoardError> {
        self.edges
            .get(edge_id)
            .ok_or_else(|| BoardError::EdgeNotFound(edge_id.0.clone()))
    }

    pub fn find_by_source(&self, source_id: &str) -> Option<&Node> {
        self.nodes
            .values()
            .find(|n| n.data.source_id.as_deref() == Some(source_id))
    }

    /// Every `sourceId` currently present on the board.
    pub fn source_ids(&self) -> HashSet<String> {
        self.nodes
            .values()
            .filter_map(|n| n.data.source_id.clone())
            .collect()
    }

    pub fn add_node(&mut self, spec: NewNode) -> Result<Node, BoardError> {
        if let Some(source_id) = &spec.data.source_id {
            if self.find_by_source(source_id).is_some() {
                return Err(BoardError::DuplicateSource(source_id.clone()));
            }
        }

        let node = Node {
            id: NodeId::generate(),
            node_type: spec.node_type,
            position: spec.position,
            data: spec.data,
            selected: false,
        };
        debug!(node_id = %node.id, node_type = %node.node_type, "add_node");
        self.nodes.insert(node.id.clone(), node.clone());
        Ok(node)
    }

    /// Remove a node together with every edge touching it.
    pub fn delete_node(&mut self, node_id: &NodeId) -> Result<(Node, Vec<Edge>), BoardError> {
        let node = self
            .nodes
            .remove(node_id)
            .ok_or_else(|| BoardError::NodeNotFound(node_id.0.clone()))?;

        let mut removed = Vec::new();
        self.edges.retain(|_, edge| {
            if edge.touches(node_id) {
                removed.push(edge.clone());
                false
            } else {
                true
            }
        });
        debug!(node_id = %node_id, cascade = removed.len(), "delete_node");
        Ok((node, removed))
    }

    pub fn update_node(&mut self, node_id: &NodeId, patch: NodePatch) -> Result<Node, BoardError> {
        debug!(node_id = %node_id, "update_node");
        let node = self
            .nodes
            .get_mut(node_id)
            .ok_or_else(|| BoardError::NodeNotFound(node_id.0.clone()))?;

        if let Some(label) = patch.label {
            node.data.label = label;
        }
        if let Some(description) = patch.description {
            node.data.description = description;
        }
        if let Some(color) = patch.color {
            node.data.color = color;
        }
        if let Some(role) = patch.role {
            node.data.role = role;
        }
        if let Some(category) = patch.category {
            node.data.category = category;
        }
        if let Some(position) = patch.position {
            node.position = position;
        }

        Ok(node.clone())
    }

    pub fn move_node(&mut self, node_id: &NodeId, position: Position) -> Result<Node, BoardError> {
        self.update_node(
            node_id,
            NodePatch {
                position: Some(position),
                ..NodePatch::default()
            },
        )
    }

    /// Create a directed edge. Self-loops and parallel edges are allowed.
    pub fn connect(&mut self, source: &NodeId, target: &NodeId) -> Result<Edge, BoardError> {
        debug!(source = %source, target = %target, "connect");
        self.node(source)?;
        self.node(target)?;

        let edge = Edge {
            id: EdgeId::generate(),
            source_node_id: source.clone(),
            target_node_id: target.clone(),
            label: String::new(),
        };
        self.edges.insert(edge.id.clone(), edge.clone());
        Ok(edge)
    }

    pub fn set_edge_label(&mut self, edge_id: &EdgeId, text: &str) -> Result<Edge, BoardError> {
        debug!(edge_id = %edge_id, "set_edge_label");
        let edge = self
            .edges
            .get_mut(edge_id)
            .ok_or_else(|| BoardError::EdgeNotFound(edge_id.0.clone()))?;
        edge.label = text.to_string();
        Ok(edge.clone())
    }

    pub fn delete_edge(&mut self, edge_id: &EdgeId) -> Result<Edge, BoardError> {
        debug!(edge_id = %edge_id, "delete_edge");
        self.edges
            .remove(edge_id)
            .ok_or_else(|| BoardError::EdgeNotFound(edge_id.0.clone()))
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    // ---- Selection ----

    pub fn selected_node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|n| n.selected)
            .map(|n| n.id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Select exactly the given nodes. Unknown ids are ignored.
    pub fn select_only(&mut self, ids: &[NodeId]) {
        let wanted: HashSet<&NodeId> = ids.iter().collect();
        for node in self.nodes.values_mut() {
            node.selected = wanted.contains(&node.id);
        }
    }

    pub fn clear_selection(&mut self) {
        for node in self.nodes.values_mut() {
            node.selected = false;
        }
    }

    /// Delete every selected node (and their edges). Returns the number of nodes removed.
    pub fn delete_selected(&mut self) -> usize {
        let ids = self.selected_node_ids();
        for id in &ids {
            // ids come from the map itself
            let _ = self.delete_node(id);
        }
        ids.len()
    }

    /// Swap in a new node and edge set wholesale. The first node wins when
    /// ids or `sourceId`s repeat, and edges with a missing endpoint or a
    /// repeated id are dropped.
    pub fn replace_contents(&mut self, nodes: Vec<Node>, edges: Vec<Edge>) {
        let total = nodes.len();
        let mut sources = HashSet::new();
        let mut kept: HashMap<NodeId, Node> = HashMap::with_capacity(total);
        for node in nodes {
            if kept.contains_key(&node.id) {
                continue;
            }
            if let Some(source_id) = &node.data.source_id {
                if !sources.insert(source_id.clone()) {
                    continue;
                }
            }
            kept.insert(node.id.clone(), node);
        }
        if kept.len() < total {
            warn!(
                dropped = total - kept.len(),
                "dropped nodes with a repeated id or sourceId"
            );
        }
        self.nodes = kept;

        let total = edges.len();
        let mut kept: HashMap<EdgeId, Edge> = HashMap::with_capacity(total);
        for edge in edges {
            if self.nodes.contains_key(&edge.source_node_id)
                && self.nodes.contains_key(&edge.target_node_id)
            {
                kept.entry(edge.id.clone()).or_insert(edge);
            }
        }
        if kept.len() < total {
            warn!(
                dropped = total - kept.len(),
                "dropped edges with missing endpoints or repeated ids"
            );
        }
        self.edges = kept;
    }
}

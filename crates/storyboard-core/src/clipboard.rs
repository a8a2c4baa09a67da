use crate::model::{GraphDocument, Node, NodeId};
use tracing::debug;

/// Single overwritable buffer of copied nodes. Edges are never copied.
pub struct ClipboardManager {
    offset: f64,
    buffer: Vec<Node>,
}

impl ClipboardManager {
    pub fn new(offset: f64) -> Self {
        ClipboardManager {
            offset,
            buffer: Vec::new(),
        }
    }

    /// Capture the selected nodes. Leaves the buffer alone when nothing is selected.
    pub fn copy_selected(&mut self, doc: &GraphDocument) -> usize {
        let copied: Vec<Node> = doc
            .selected_node_ids()
            .iter()
            .filter_map(|id| doc.nodes.get(id))
            .map(Node::detached)
            .collect();
        if copied.is_empty() {
            return 0;
        }
        debug!(count = copied.len(), "copy_selected");
        self.buffer = copied;
        self.buffer.len()
    }

    /// Insert a fresh copy of every buffered node, shifted by the paste offset.
    /// Pasted nodes never carry a `sourceId` and become the new selection.
    pub fn paste(&mut self, doc: &mut GraphDocument) -> Vec<Node> {
        if self.buffer.is_empty() {
            return Vec::new();
        }

        let pasted: Vec<Node> = self
            .buffer
            .iter()
            .map(|source| {
                let mut node = source.detached();
                node.id = NodeId::generate();
                node.position = source.position.offset(self.offset, self.offset);
                node.data.source_id = None;
                node
            })
            .collect();

        for node in &pasted {
            doc.nodes.insert(node.id.clone(), node.clone());
        }
        let ids: Vec<NodeId> = pasted.iter().map(|n| n.id.clone()).collect();
        doc.select_only(&ids);

        // Repeated pastes cascade instead of stacking on the same spot.
        self.buffer = pasted.clone();
        debug!(count = pasted.len(), "paste");
        pasted
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;
    use std::collections::HashSet;

    fn add(doc: &mut GraphDocument, x: f64, y: f64, source: Option<&str>) -> Node {
        let data = NodeData {
            label: format!("{x},{y}"),
            source_id: source.map(str::to_string),
            ..NodeData::default()
        };
        doc.add_node(NewNode::new(NodeType::Character, Position::new(x, y)).with_data(data))
            .unwrap()
    }

    #[test]
    fn test_copy_paste_offsets_selected_nodes() {
        let mut doc = GraphDocument::new();
        let a = add(&mut doc, 0.0, 0.0, None);
        let b = add(&mut doc, 50.0, 50.0, None);
        doc.select_only(&[a.id.clone(), b.id.clone()]);

        let mut clipboard = ClipboardManager::new(40.0);
        assert_eq!(clipboard.copy_selected(&doc), 2);
        let pasted = clipboard.paste(&mut doc);

        assert_eq!(pasted.len(), 2);
        assert_eq!(doc.nodes.len(), 4);
        let mut positions: Vec<(f64, f64)> =
            pasted.iter().map(|n| (n.position.x, n.position.y)).collect();
        positions.sort_by(|l, r| l.0.total_cmp(&r.0));
        assert_eq!(positions, vec![(40.0, 40.0), (90.0, 90.0)]);

        let ids: HashSet<&NodeId> = doc.nodes.keys().collect();
        assert_eq!(ids.len(), 4);
        assert!(pasted.iter().all(|n| n.id != a.id && n.id != b.id));
    }

    #[test]
    fn test_paste_strips_source_id() {
        let mut doc = GraphDocument::new();
        let imported = add(&mut doc, 10.0, 10.0, Some("c1"));
        doc.select_only(&[imported.id.clone()]);

        let mut clipboard = ClipboardManager::new(40.0);
        clipboard.copy_selected(&doc);
        let pasted = clipboard.paste(&mut doc);

        assert_eq!(pasted.len(), 1);
        assert!(pasted[0].data.source_id.is_none());
        assert_eq!(pasted[0].data.label, imported.data.label);
        assert_eq!(doc.source_ids().len(), 1);
    }

    #[test]
    fn test_paste_moves_selection_to_new_nodes() {
        let mut doc = GraphDocument::new();
        let a = add(&mut doc, 0.0, 0.0, None);
        doc.select_only(&[a.id.clone()]);

        let mut clipboard = ClipboardManager::new(40.0);
        clipboard.copy_selected(&doc);
        let pasted = clipboard.paste(&mut doc);
        assert_eq!(doc.selected_node_ids(), vec![pasted[0].id.clone()]);
        assert!(!doc.nodes[&a.id].selected);
    }

    #[test]
    fn test_repeated_paste_cascades() {
        let mut doc = GraphDocument::new();
        let a = add(&mut doc, 0.0, 0.0, None);
        doc.select_only(&[a.id.clone()]);

        let mut clipboard = ClipboardManager::new(40.0);
        clipboard.copy_selected(&doc);
        clipboard.paste(&mut doc);
        let second = clipboard.paste(&mut doc);
        assert_eq!(second[0].position, Position::new(80.0, 80.0));
    }

    #[test]
    fn test_copy_with_empty_selection_keeps_buffer() {
        let mut doc = GraphDocument::new();
        let a = add(&mut doc, 0.0, 0.0, None);
        doc.select_only(&[a.id.clone()]);

        let mut clipboard = ClipboardManager::new(40.0);
        clipboard.copy_selected(&doc);
        doc.clear_selection();
        assert_eq!(clipboard.copy_selected(&doc), 0);
        assert!(!clipboard.is_empty());
    }

    #[test]
    fn test_edges_are_not_copied() {
        let mut doc = GraphDocument::new();
        let a = add(&mut doc, 0.0, 0.0, None);
        let b = add(&mut doc, 1.0, 1.0, None);
        doc.connect(&a.id, &b.id).unwrap();
        doc.select_only(&[a.id.clone(), b.id.clone()]);

        let mut clipboard = ClipboardManager::new(40.0);
        clipboard.copy_selected(&doc);
        clipboard.paste(&mut doc);
        assert_eq!(doc.edges.len(), 1);
    }

    #[test]
    fn test_paste_on_empty_clipboard() {
        let mut doc = GraphDocument::new();
        let mut clipboard = ClipboardManager::new(40.0);
        assert!(clipboard.paste(&mut doc).is_empty());
        assert!(doc.nodes.is_empty());
    }
}

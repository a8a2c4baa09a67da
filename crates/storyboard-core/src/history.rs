use crate::model::{GraphDocument, Snapshot};
use sha2::{Digest, Sha256};
use std::collections::VecDeque;
use tracing::debug;

/// Digest of everything history cares about: node ids, positions and data,
/// edge ids and labels. Selection and viewport are not part of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature(pub String);

pub fn structural_signature(doc: &GraphDocument) -> Signature {
    // One JSON array per item; string escaping keeps labels from spilling
    // into neighbouring records.
    let mut hasher = Sha256::new();
    for node in doc.sorted_nodes() {
        let record = serde_json::to_string(&(
            "n",
            &node.id,
            node.position.x,
            node.position.y,
            &node.data,
        ))
        .expect("node record serialization");
        hasher.update(record);
        hasher.update(b"\n");
    }
    for edge in doc.sorted_edges() {
        let record =
            serde_json::to_string(&("e", &edge.id, &edge.label)).expect("edge record serialization");
        hasher.update(record);
        hasher.update(b"\n");
    }
    Signature(format!("{:x}", hasher.finalize()))
}

/// Snapshot-based undo/redo over a single board.
pub struct HistoryManager {
    limit: usize,
    undo_stack: VecDeque<Snapshot>,
    redo_stack: VecDeque<Snapshot>,
    /// Last recorded state and its signature.
    last: Option<(Signature, Snapshot)>,
    restoring: bool,
}

impl HistoryManager {
    pub fn new(limit: usize) -> Self {
        HistoryManager {
            limit: limit.max(1),
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            last: None,
            restoring: false,
        }
    }

    /// Record the document after a change. The previous state is pushed onto
    /// the undo stack only when the structural signature moved. Returns
    /// whether an entry was recorded.
    pub fn observe(&mut self, doc: &GraphDocument) -> bool {
        if self.restoring {
            return false;
        }

        let signature = structural_signature(doc);
        if matches!(&self.last, Some((last, _)) if *last == signature) {
            return false;
        }

        let current = Snapshot::capture(doc);
        match self.last.replace((signature, current)) {
            Some((_, previous)) => {
                push_bounded(&mut self.undo_stack, previous, self.limit);
                self.redo_stack.clear();
                debug!(undo = self.undo_stack.len(), "history entry recorded");
                true
            }
            // First observation after a reset is the baseline.
            None => false,
        }
    }

    pub fn undo(&mut self, doc: &mut GraphDocument) -> bool {
        let Some(previous) = self.undo_stack.pop_back() else {
            return false;
        };
        push_bounded(&mut self.redo_stack, Snapshot::capture(doc), self.limit);
        self.apply(previous, doc);
        debug!(undo = self.undo_stack.len(), redo = self.redo_stack.len(), "undo");
        true
    }

    pub fn redo(&mut self, doc: &mut GraphDocument) -> bool {
        let Some(next) = self.redo_stack.pop_back() else {
            return false;
        };
        push_bounded(&mut self.undo_stack, Snapshot::capture(doc), self.limit);
        self.apply(next, doc);
        debug!(undo = self.undo_stack.len(), redo = self.redo_stack.len(), "redo");
        true
    }

    fn apply(&mut self, snapshot: Snapshot, doc: &mut GraphDocument) {
        self.restoring = true;
        snapshot.restore_into(doc);
        self.last = Some((structural_signature(doc), snapshot));
    }

    /// Next scheduling tick: the mutation caused by undo/redo has settled.
    pub fn tick(&mut self) {
        self.restoring = false;
    }

    pub fn is_restoring(&self) -> bool {
        self.restoring
    }

    /// Forget everything. Used when switching to another document.
    pub fn reset(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.last = None;
        self.restoring = false;
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }
}

fn push_bounded(stack: &mut VecDeque<Snapshot>, snapshot: Snapshot, limit: usize) {
    if stack.len() >= limit {
        stack.pop_front();
    }
    stack.push_back(snapshot);
}

use crate::boundary::{
    BoardStorage, CanvasChange, CanvasView, EntityProvider, FileBoundary, ScreenPoint,
};
use crate::clipboard::ClipboardManager;
use crate::config::BoardConfig;
use crate::error::BoardError;
use crate::export;
use crate::history::HistoryManager;
use crate::import::{self, ImportCandidate, ImportPlan};
use crate::model::*;
use crate::notice::{Notice, NoticeKind};
use crate::persistence::{LoadOutcome, LoadTicket, PersistenceGateway};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

/// The board engine for one open work-document at a time.
///
/// Every successful mutation goes through [`BoardSession::mutate`], which
/// lets history observe the new state and re-arms the save timer. Hosts
/// drive time by calling [`BoardSession::tick`] from their event loop.
pub struct BoardSession {
    config: BoardConfig,
    document: GraphDocument,
    history: HistoryManager,
    clipboard: ClipboardManager,
    persistence: PersistenceGateway,
    notices: Vec<Notice>,
}

impl BoardSession {
    pub fn new(config: BoardConfig) -> Self {
        BoardSession {
            history: HistoryManager::new(config.history_limit),
            clipboard: ClipboardManager::new(config.paste_offset),
            persistence: PersistenceGateway::new(config.save_delay()),
            document: GraphDocument::new(),
            notices: Vec::new(),
            config,
        }
    }

    pub fn document(&self) -> &GraphDocument {
        &self.document
    }

    pub fn document_id(&self) -> Option<&str> {
        self.persistence.document_id()
    }

    pub fn is_loaded(&self) -> bool {
        self.persistence.is_loaded()
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn has_pending_save(&self) -> bool {
        self.persistence.has_pending_save()
    }

    /// Take the user-visible failures collected since the last call.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn report(&mut self, kind: NoticeKind, err: &BoardError) {
        self.notices.push(Notice::from_error(kind, err));
    }

    // ---- Document lifecycle ----

    /// Leave the current document and start loading `document_id`. A pending
    /// save for the previous document is written first. History, clipboard
    /// and board are reset; the returned ticket completes the load.
    pub fn switch_document(&mut self, document_id: &str, storage: &dyn BoardStorage) -> LoadTicket {
        if let Some(Err(err)) = self.persistence.flush_save(&self.document, storage) {
            self.report(NoticeKind::SaveFailure, &err);
        }
        info!(from = ?self.persistence.document_id(), to = %document_id, "switching document");

        self.history.reset();
        self.clipboard.clear();
        self.document = GraphDocument::new();
        self.persistence.begin_load(document_id)
    }

    /// Apply the storage response for `ticket`. Returns false when the
    /// response was stale and dropped.
    pub fn finish_load(
        &mut self,
        ticket: &LoadTicket,
        result: Result<Option<BoardPayload>, BoardError>,
        canvas: Option<&mut dyn CanvasView>,
    ) -> bool {
        match self
            .persistence
            .complete_load(ticket, result, &mut self.document, canvas)
        {
            LoadOutcome::Stale => return false,
            LoadOutcome::Failed(err) => self.report(NoticeKind::LoadFailure, &err),
            LoadOutcome::Applied => {}
        }
        self.history.reset();
        self.history.observe(&self.document);
        true
    }

    /// Switch and load in one step against a synchronous storage.
    pub fn open_document(
        &mut self,
        document_id: &str,
        storage: &dyn BoardStorage,
        canvas: Option<&mut dyn CanvasView>,
    ) -> bool {
        let ticket = self.switch_document(document_id, storage);
        let result = storage.get(document_id);
        self.finish_load(&ticket, result, canvas)
    }

    /// Advance the scheduler: ends undo/redo restoration and fires the save
    /// timer when it has settled.
    pub fn tick(&mut self, now: Instant, storage: &dyn BoardStorage) {
        self.history.tick();
        if let Some(Err(err)) = self.persistence.poll_save(now, &self.document, storage) {
            self.report(NoticeKind::SaveFailure, &err);
        }
    }

    // ---- Mutations ----

    /// Run a mutation against the board and, if it succeeds, record it.
    pub fn mutate<T>(
        &mut self,
        now: Instant,
        op: impl FnOnce(&mut GraphDocument) -> Result<T, BoardError>,
    ) -> Result<T, BoardError> {
        let value = op(&mut self.document)?;
        self.changed(now);
        Ok(value)
    }

    fn changed(&mut self, now: Instant) {
        self.history.observe(&self.document);
        self.persistence.schedule_save(now);
    }

    pub fn add_node(&mut self, spec: NewNode, now: Instant) -> Result<Node, BoardError> {
        self.mutate(now, |doc| doc.add_node(spec))
    }

    /// Add a free node where the user clicked on the canvas.
    pub fn add_node_at(
        &mut self,
        node_type: NodeType,
        point: ScreenPoint,
        canvas: &dyn CanvasView,
        now: Instant,
    ) -> Result<Node, BoardError> {
        let position = canvas.to_document_coordinates(point);
        self.add_node(NewNode::new(node_type, position), now)
    }

    pub fn delete_node(&mut self, node_id: &NodeId, now: Instant) -> Result<(Node, Vec<Edge>), BoardError> {
        self.mutate(now, |doc| doc.delete_node(node_id))
    }

    pub fn update_node(&mut self, node_id: &NodeId, patch: NodePatch, now: Instant) -> Result<Node, BoardError> {
        self.mutate(now, |doc| doc.update_node(node_id, patch))
    }

    pub fn connect(&mut self, source: &NodeId, target: &NodeId, now: Instant) -> Result<Edge, BoardError> {
        self.mutate(now, |doc| doc.connect(source, target))
    }

    pub fn set_edge_label(&mut self, edge_id: &EdgeId, text: &str, now: Instant) -> Result<Edge, BoardError> {
        self.mutate(now, |doc| doc.set_edge_label(edge_id, text))
    }

    pub fn delete_edge(&mut self, edge_id: &EdgeId, now: Instant) -> Result<Edge, BoardError> {
        self.mutate(now, |doc| doc.delete_edge(edge_id))
    }

    pub fn delete_selected(&mut self, now: Instant) -> usize {
        let removed = self.document.delete_selected();
        if removed > 0 {
            self.changed(now);
        }
        removed
    }

    /// Selection is view state: it is neither recorded nor saved.
    pub fn select(&mut self, node_ids: &[NodeId]) {
        self.document.select_only(node_ids);
    }

    pub fn set_viewport(&mut self, viewport: Viewport, now: Instant) {
        self.document.set_viewport(viewport);
        self.persistence.schedule_save(now);
    }

    // ---- View ----

    pub fn fit_view(&mut self, canvas: &mut dyn CanvasView, now: Instant) {
        canvas.fit_view();
        self.set_viewport(canvas.viewport(), now);
    }

    pub fn zoom_in(&mut self, canvas: &mut dyn CanvasView, now: Instant) {
        canvas.zoom_in();
        self.set_viewport(canvas.viewport(), now);
    }

    pub fn zoom_out(&mut self, canvas: &mut dyn CanvasView, now: Instant) {
        canvas.zoom_out();
        self.set_viewport(canvas.viewport(), now);
    }

    /// Translate a canvas gesture into the matching board mutation.
    pub fn apply_canvas_change(&mut self, change: CanvasChange, now: Instant) -> Result<(), BoardError> {
        debug!(change = ?change, "canvas change");
        match change {
            CanvasChange::NodeMoved { node_id, position } => {
                self.mutate(now, |doc| doc.move_node(&node_id, position))?;
            }
            CanvasChange::Connected { source, target } => {
                self.connect(&source, &target, now)?;
            }
            CanvasChange::SelectionChanged { node_ids } => self.select(&node_ids),
            CanvasChange::NodesRemoved { node_ids } => {
                self.mutate(now, |doc| {
                    for id in &node_ids {
                        // Already gone through an earlier cascade.
                        let _ = doc.delete_node(id);
                    }
                    Ok(())
                })?;
            }
            CanvasChange::EdgesRemoved { edge_ids } => {
                self.mutate(now, |doc| {
                    for id in &edge_ids {
                        let _ = doc.delete_edge(id);
                    }
                    Ok(())
                })?;
            }
            CanvasChange::ViewportChanged { viewport } => self.set_viewport(viewport, now),
        }
        Ok(())
    }

    // ---- History ----

    pub fn undo(&mut self, now: Instant) -> bool {
        let applied = self.history.undo(&mut self.document);
        if applied {
            self.persistence.schedule_save(now);
        }
        applied
    }

    pub fn redo(&mut self, now: Instant) -> bool {
        let applied = self.history.redo(&mut self.document);
        if applied {
            self.persistence.schedule_save(now);
        }
        applied
    }

    // ---- Clipboard ----

    pub fn copy_selected(&mut self) -> usize {
        self.clipboard.copy_selected(&self.document)
    }

    pub fn paste(&mut self, now: Instant) -> Vec<Node> {
        let pasted = self.clipboard.paste(&mut self.document);
        if !pasted.is_empty() {
            self.changed(now);
        }
        pasted
    }

    // ---- Entity import ----

    /// Candidates for the import dialog, split into importable and already-present.
    pub fn import_plan(&self, providers: &[&dyn EntityProvider], work_id: &str) -> ImportPlan {
        let candidates = import::collect_candidates(providers, work_id);
        import::plan_import(candidates, &self.document.source_ids())
    }

    /// Place the accepted candidates around the center of the visible area.
    pub fn import_entities(
        &mut self,
        accepted: &[ImportCandidate],
        canvas: &dyn CanvasView,
        now: Instant,
    ) -> Result<Vec<Node>, BoardError> {
        let center = canvas.center();
        let spacing = self.config.import_spacing;
        let added = import::import_entities(&mut self.document, accepted, center, spacing)?;
        if !added.is_empty() {
            self.changed(now);
        }
        Ok(added)
    }

    // ---- JSON / image export ----

    pub fn export_json(&mut self, files: &dyn FileBoundary, stem: &str) -> Option<PathBuf> {
        match export::export_json_to_file(&self.document, files, stem) {
            Ok(path) => path,
            Err(err) => {
                self.report(NoticeKind::ExportFailure, &err);
                None
            }
        }
    }

    pub fn export_image(&mut self, canvas: &dyn CanvasView, files: &dyn FileBoundary, stem: &str) -> Option<PathBuf> {
        match export::export_image(canvas, files, stem) {
            Ok(path) => path,
            Err(err) => {
                self.report(NoticeKind::ExportFailure, &err);
                None
            }
        }
    }

    /// Replace the board with an exported one. Prior undo history is
    /// discarded; the imported board becomes the new baseline.
    pub fn import_json(&mut self, text: &str, now: Instant) -> bool {
        if let Err(err) = export::import_json(&mut self.document, text) {
            self.report(NoticeKind::ImportValidationFailure, &err);
            return false;
        }
        self.rebaseline(now);
        true
    }

    /// `false` when the user cancelled or the file could not be imported.
    pub fn import_json_from_file(&mut self, files: &dyn FileBoundary, now: Instant) -> bool {
        match export::import_json_from_file(&mut self.document, files) {
            Ok(true) => {
                self.rebaseline(now);
                true
            }
            Ok(false) => false,
            Err(err) => {
                let kind = match err {
                    BoardError::ImportValidation(_) => NoticeKind::ImportValidationFailure,
                    _ => NoticeKind::FileReadFailure,
                };
                self.report(kind, &err);
                false
            }
        }
    }

    fn rebaseline(&mut self, now: Instant) {
        self.history.reset();
        self.history.observe(&self.document);
        self.persistence.schedule_save(now);
    }
}

//! Interfaces of the collaborators the engine talks to, plus a directory-backed
//! [`BoardStorage`].

use crate::error::BoardError;
use crate::import::{EntityKind, ExternalEntity};
use crate::model::{BoardPayload, EdgeId, NodeId, Position, Viewport};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Persistent home of each document's board.
pub trait BoardStorage {
    fn get(&self, document_id: &str) -> Result<Option<BoardPayload>, BoardError>;
    fn save(&self, document_id: &str, payload: &str) -> Result<(), BoardError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFilter {
    Json,
    Png,
}

impl FileFilter {
    pub fn extension(&self) -> &'static str {
        match self {
            FileFilter::Json => "json",
            FileFilter::Png => "png",
        }
    }
}

/// Native save/open dialogs. `Ok(None)` means the user cancelled.
pub trait FileBoundary {
    fn save_file(
        &self,
        suggested_name: &str,
        filter: FileFilter,
        contents: &[u8],
    ) -> Result<Option<PathBuf>, BoardError>;

    fn open_file(&self, filter: FileFilter) -> Result<Option<String>, BoardError>;
}

/// Source of importable entities of one kind, e.g. the characters table.
pub trait EntityProvider {
    fn kind(&self) -> EntityKind;
    fn list_for_work(&self, work_id: &str) -> Result<Vec<ExternalEntity>, BoardError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

/// The rendering surface. It owns hit-testing, gestures and any view callbacks.
pub trait CanvasView {
    fn to_document_coordinates(&self, point: ScreenPoint) -> Position;
    fn rasterize(&self) -> Result<Vec<u8>, BoardError>;
    fn fit_view(&mut self);
    fn zoom_in(&mut self);
    fn zoom_out(&mut self);
    fn viewport(&self) -> Viewport;
    fn set_viewport(&mut self, viewport: Viewport);
    /// Center of the visible area in document coordinates.
    fn center(&self) -> Position;
}

/// Gesture notifications coming back from the canvas.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasChange {
    NodeMoved { node_id: NodeId, position: Position },
    Connected { source: NodeId, target: NodeId },
    SelectionChanged { node_ids: Vec<NodeId> },
    NodesRemoved { node_ids: Vec<NodeId> },
    EdgesRemoved { edge_ids: Vec<EdgeId> },
    ViewportChanged { viewport: Viewport },
}

/// One `<document_id>.json` file per board inside `dir`.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn open(dir: &Path) -> Result<Self, BoardError> {
        fs::create_dir_all(dir)?;
        info!(dir = %dir.display(), "file storage opened");
        Ok(FileStorage {
            dir: dir.to_path_buf(),
        })
    }

    fn board_path(&self, document_id: &str) -> Result<PathBuf, BoardError> {
        let valid = !document_id.is_empty()
            && document_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(BoardError::Storage(format!(
                "invalid document id '{document_id}'"
            )));
        }
        Ok(self.dir.join(format!("{document_id}.json")))
    }
}

impl BoardStorage for FileStorage {
    fn get(&self, document_id: &str) -> Result<Option<BoardPayload>, BoardError> {
        let path = self.board_path(document_id)?;
        if !path.exists() {
            return Ok(None);
        }
        debug!(path = %path.display(), "reading board");
        let data = fs::read_to_string(&path)?;
        let payload: BoardPayload = serde_json::from_str(&data)?;
        Ok(Some(payload))
    }

    fn save(&self, document_id: &str, payload: &str) -> Result<(), BoardError> {
        let path = self.board_path(document_id)?;
        debug!(path = %path.display(), "writing board");
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, payload)?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }
}

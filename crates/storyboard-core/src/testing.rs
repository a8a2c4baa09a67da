//! In-memory stand-ins for the external collaborators.

use crate::boundary::{BoardStorage, CanvasView, EntityProvider, FileBoundary, FileFilter, ScreenPoint};
use crate::error::BoardError;
use crate::import::{EntityKind, ExternalEntity};
use crate::model::{BoardPayload, GraphDocument, Position, Viewport};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Default)]
pub struct MemoryStorage {
    boards: RefCell<HashMap<String, String>>,
    saves: Cell<usize>,
    fail_saves: Cell<bool>,
    fail_gets: Cell<bool>,
}

impl MemoryStorage {
    pub fn put(&self, document_id: &str, doc: &GraphDocument) {
        let json = serde_json::to_string(&BoardPayload::from_document(doc)).unwrap();
        self.boards.borrow_mut().insert(document_id.to_string(), json);
    }

    pub fn stored(&self, document_id: &str) -> Option<BoardPayload> {
        self.boards
            .borrow()
            .get(document_id)
            .map(|json| serde_json::from_str(json).unwrap())
    }

    pub fn save_count(&self) -> usize {
        self.saves.get()
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.set(fail);
    }

    pub fn fail_gets(&self, fail: bool) {
        self.fail_gets.set(fail);
    }
}

impl BoardStorage for MemoryStorage {
    fn get(&self, document_id: &str) -> Result<Option<BoardPayload>, BoardError> {
        if self.fail_gets.get() {
            return Err(BoardError::Storage("read refused".to_string()));
        }
        Ok(self.stored(document_id))
    }

    fn save(&self, document_id: &str, payload: &str) -> Result<(), BoardError> {
        if self.fail_saves.get() {
            return Err(BoardError::Storage("write refused".to_string()));
        }
        self.saves.set(self.saves.get() + 1);
        self.boards
            .borrow_mut()
            .insert(document_id.to_string(), payload.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeCanvas {
    pub viewport: Viewport,
    pub center: Position,
    pub fit_calls: usize,
    rasterize_fails: bool,
}

impl FakeCanvas {
    pub fn centered_on(center: Position) -> Self {
        FakeCanvas {
            center,
            ..FakeCanvas::default()
        }
    }

    pub fn failing_rasterize() -> Self {
        FakeCanvas {
            rasterize_fails: true,
            ..FakeCanvas::default()
        }
    }
}

impl CanvasView for FakeCanvas {
    fn to_document_coordinates(&self, point: ScreenPoint) -> Position {
        Position::new(
            (point.x - self.viewport.x) / self.viewport.zoom,
            (point.y - self.viewport.y) / self.viewport.zoom,
        )
    }

    fn rasterize(&self) -> Result<Vec<u8>, BoardError> {
        if self.rasterize_fails {
            return Err(BoardError::Export("no rendering context".to_string()));
        }
        Ok(vec![0x89, b'P', b'N', b'G'])
    }

    fn fit_view(&mut self) {
        self.fit_calls += 1;
    }

    fn zoom_in(&mut self) {
        self.viewport.zoom *= 1.2;
    }

    fn zoom_out(&mut self) {
        self.viewport.zoom /= 1.2;
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn center(&self) -> Position {
        self.center
    }
}

#[derive(Default)]
pub struct FakeFiles {
    saved: RefCell<Vec<(String, FileFilter, Vec<u8>)>>,
    open_text: Option<String>,
    cancel: bool,
    unreadable: bool,
}

impl FakeFiles {
    pub fn cancelling() -> Self {
        FakeFiles {
            cancel: true,
            ..FakeFiles::default()
        }
    }

    pub fn unreadable() -> Self {
        FakeFiles {
            unreadable: true,
            ..FakeFiles::default()
        }
    }

    pub fn opening(text: &str) -> Self {
        FakeFiles {
            open_text: Some(text.to_string()),
            ..FakeFiles::default()
        }
    }

    pub fn saved(&self) -> Vec<(String, FileFilter, Vec<u8>)> {
        self.saved.borrow().clone()
    }
}

impl FileBoundary for FakeFiles {
    fn save_file(
        &self,
        suggested_name: &str,
        filter: FileFilter,
        contents: &[u8],
    ) -> Result<Option<PathBuf>, BoardError> {
        if self.cancel {
            return Ok(None);
        }
        self.saved
            .borrow_mut()
            .push((suggested_name.to_string(), filter, contents.to_vec()));
        Ok(Some(PathBuf::from("/exports").join(suggested_name)))
    }

    fn open_file(&self, _filter: FileFilter) -> Result<Option<String>, BoardError> {
        if self.unreadable {
            return Err(BoardError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "file is locked",
            )));
        }
        if self.cancel {
            return Ok(None);
        }
        Ok(self.open_text.clone())
    }
}

pub struct FakeProvider {
    kind: EntityKind,
    entities: Vec<ExternalEntity>,
    fail: bool,
}

impl FakeProvider {
    pub fn new(kind: EntityKind, entities: Vec<ExternalEntity>) -> Self {
        FakeProvider {
            kind,
            entities,
            fail: false,
        }
    }

    pub fn failing(kind: EntityKind) -> Self {
        FakeProvider {
            kind,
            entities: Vec::new(),
            fail: true,
        }
    }
}

impl EntityProvider for FakeProvider {
    fn kind(&self) -> EntityKind {
        self.kind
    }

    fn list_for_work(&self, work_id: &str) -> Result<Vec<ExternalEntity>, BoardError> {
        if self.fail {
            return Err(BoardError::Storage(format!("{} unavailable for {work_id}", self.kind)));
        }
        Ok(self.entities.clone())
    }
}

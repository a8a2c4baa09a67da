use crate::boundary::{BoardStorage, CanvasView};
use crate::error::BoardError;
use crate::model::{BoardPayload, GraphDocument};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Identifies one load request. Only the most recent ticket may touch the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    document_id: String,
}

impl LoadTicket {
    pub fn document_id(&self) -> &str {
        &self.document_id
    }
}

#[derive(Debug)]
pub enum LoadOutcome {
    /// The stored board (or an empty one when nothing was stored) is live.
    Applied,
    /// The read failed; an empty board is live and saving is enabled.
    Failed(BoardError),
    /// A newer load was started since; the response was dropped.
    Stale,
}

/// Debounced saves and race-safe loads for the active document.
pub struct PersistenceGateway {
    save_delay: Duration,
    document_id: Option<String>,
    generation: u64,
    is_loaded: bool,
    save_deadline: Option<Instant>,
}

impl PersistenceGateway {
    pub fn new(save_delay: Duration) -> Self {
        PersistenceGateway {
            save_delay,
            document_id: None,
            generation: 0,
            is_loaded: false,
            save_deadline: None,
        }
    }

    pub fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.is_loaded
    }

    pub fn has_pending_save(&self) -> bool {
        self.save_deadline.is_some()
    }

    // ---- Load ----

    /// Start loading `document_id`. Any earlier ticket becomes stale and any
    /// pending save is dropped.
    pub fn begin_load(&mut self, document_id: &str) -> LoadTicket {
        self.generation += 1;
        self.document_id = Some(document_id.to_string());
        self.is_loaded = false;
        self.save_deadline = None;
        debug!(document_id = %document_id, generation = self.generation, "load started");
        LoadTicket {
            generation: self.generation,
            document_id: document_id.to_string(),
        }
    }

    pub fn complete_load(
        &mut self,
        ticket: &LoadTicket,
        result: Result<Option<BoardPayload>, BoardError>,
        doc: &mut GraphDocument,
        canvas: Option<&mut dyn CanvasView>,
    ) -> LoadOutcome {
        if ticket.generation != self.generation {
            debug!(
                document_id = %ticket.document_id,
                generation = ticket.generation,
                current = self.generation,
                "dropping stale load response"
            );
            return LoadOutcome::Stale;
        }

        let outcome = match result {
            Ok(Some(payload)) => {
                *doc = payload.into_document();
                LoadOutcome::Applied
            }
            Ok(None) => {
                *doc = GraphDocument::new();
                LoadOutcome::Applied
            }
            Err(err) => {
                *doc = GraphDocument::new();
                LoadOutcome::Failed(err)
            }
        };

        self.is_loaded = true;
        if let Some(canvas) = canvas {
            canvas.set_viewport(doc.viewport);
        }
        info!(
            document_id = %ticket.document_id,
            nodes = doc.nodes.len(),
            edges = doc.edges.len(),
            "board loaded"
        );
        outcome
    }

    /// Begin and complete a load in one step against a synchronous storage.
    pub fn load_blocking(
        &mut self,
        document_id: &str,
        storage: &dyn BoardStorage,
        doc: &mut GraphDocument,
        canvas: Option<&mut dyn CanvasView>,
    ) -> LoadOutcome {
        let ticket = self.begin_load(document_id);
        let result = storage.get(document_id);
        self.complete_load(&ticket, result, doc, canvas)
    }

    // ---- Save ----

    /// Re-arm the trailing save timer. Every change calls this.
    pub fn schedule_save(&mut self, now: Instant) {
        if self.document_id.is_some() {
            self.save_deadline = Some(now + self.save_delay);
        }
    }

    /// Fire the save if the timer survived until `now`. Returns the write
    /// result when a write was issued.
    pub fn poll_save(
        &mut self,
        now: Instant,
        doc: &GraphDocument,
        storage: &dyn BoardStorage,
    ) -> Option<Result<(), BoardError>> {
        match self.save_deadline {
            Some(deadline) if now >= deadline => {
                self.save_deadline = None;
                self.save_if_loaded(doc, storage)
            }
            _ => None,
        }
    }

    /// Write a pending save right away.
    pub fn flush_save(
        &mut self,
        doc: &GraphDocument,
        storage: &dyn BoardStorage,
    ) -> Option<Result<(), BoardError>> {
        self.save_deadline.take()?;
        self.save_if_loaded(doc, storage)
    }

    fn save_if_loaded(
        &self,
        doc: &GraphDocument,
        storage: &dyn BoardStorage,
    ) -> Option<Result<(), BoardError>> {
        if !self.is_loaded {
            debug!("skipping save before load completed");
            return None;
        }
        let document_id = self.document_id.as_deref()?;
        Some(save_board(document_id, doc, storage))
    }
}

pub fn save_board(
    document_id: &str,
    doc: &GraphDocument,
    storage: &dyn BoardStorage,
) -> Result<(), BoardError> {
    let payload = BoardPayload::from_document(doc).stamped();
    let json = serde_json::to_string(&payload)?;
    storage.save(document_id, &json)?;
    info!(
        document_id = %document_id,
        nodes = payload.nodes.len(),
        edges = payload.edges.len(),
        "board saved"
    );
    Ok(())
}

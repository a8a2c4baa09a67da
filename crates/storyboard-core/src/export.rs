use crate::boundary::{CanvasView, FileBoundary, FileFilter};
use crate::error::BoardError;
use crate::model::{BoardPayload, GraphDocument};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info};

/// File name offered in the save dialog, e.g. `my-novel-graph.json`.
pub fn suggested_file_name(stem: &str, filter: FileFilter) -> String {
    let slug: String = stem
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    let slug = slug.trim_matches('-');
    let slug = if slug.is_empty() { "board" } else { slug };
    format!("{slug}-graph.{}", filter.extension())
}

pub fn export_json(doc: &GraphDocument) -> Result<String, BoardError> {
    let payload = BoardPayload::from_document(doc);
    Ok(serde_json::to_string_pretty(&payload)?)
}

/// Hand the JSON export to the file boundary. `Ok(None)` when the user cancelled.
pub fn export_json_to_file(
    doc: &GraphDocument,
    files: &dyn FileBoundary,
    stem: &str,
) -> Result<Option<PathBuf>, BoardError> {
    let json = export_json(doc)?;
    let path = files.save_file(
        &suggested_file_name(stem, FileFilter::Json),
        FileFilter::Json,
        json.as_bytes(),
    )?;
    if let Some(path) = &path {
        info!(path = %path.display(), "board exported as JSON");
    }
    Ok(path)
}

/// Rasterize the board and hand the image to the file boundary. Nothing is
/// written when rasterizing fails.
pub fn export_image(
    canvas: &dyn CanvasView,
    files: &dyn FileBoundary,
    stem: &str,
) -> Result<Option<PathBuf>, BoardError> {
    let image = canvas.rasterize()?;
    if image.is_empty() {
        return Err(BoardError::Export("canvas produced an empty image".to_string()));
    }
    let path = files.save_file(
        &suggested_file_name(stem, FileFilter::Png),
        FileFilter::Png,
        &image,
    )?;
    if let Some(path) = &path {
        info!(path = %path.display(), bytes = image.len(), "board exported as image");
    }
    Ok(path)
}

/// Parse a board export. Both `nodes` and `edges` must be present.
pub fn parse_board_json(text: &str) -> Result<BoardPayload, BoardError> {
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| BoardError::ImportValidation(format!("not valid JSON: {e}")))?;

    for field in ["nodes", "edges"] {
        if value.get(field).is_none() {
            return Err(BoardError::ImportValidation(format!(
                "missing '{field}' field"
            )));
        }
    }

    let payload: BoardPayload =
        serde_json::from_value(value).map_err(|e| BoardError::ImportValidation(e.to_string()))?;
    check_unique(&payload)?;
    Ok(payload)
}

/// Node ids, edge ids and `sourceId`s must each appear at most once.
fn check_unique(payload: &BoardPayload) -> Result<(), BoardError> {
    let mut node_ids = HashSet::new();
    let mut sources = HashSet::new();
    for node in &payload.nodes {
        if !node_ids.insert(&node.id) {
            return Err(BoardError::ImportValidation(format!(
                "duplicate node id '{}'",
                node.id
            )));
        }
        if let Some(source_id) = &node.data.source_id {
            if !sources.insert(source_id.as_str()) {
                return Err(BoardError::ImportValidation(format!(
                    "more than one node imported from source '{source_id}'"
                )));
            }
        }
    }

    let mut edge_ids = HashSet::new();
    for edge in &payload.edges {
        if !edge_ids.insert(&edge.id) {
            return Err(BoardError::ImportValidation(format!(
                "duplicate edge id '{}'",
                edge.id
            )));
        }
    }
    Ok(())
}

/// Replace the document's nodes and edges with the parsed board. The viewport
/// is kept. On error the document is untouched.
pub fn import_json(doc: &mut GraphDocument, text: &str) -> Result<(), BoardError> {
    let payload = parse_board_json(text)?;
    debug!(nodes = payload.nodes.len(), edges = payload.edges.len(), "import_json");
    doc.replace_contents(payload.nodes, payload.edges);
    Ok(())
}

/// Ask the file boundary for a board file and import it. `Ok(false)` when the
/// user cancelled.
pub fn import_json_from_file(
    doc: &mut GraphDocument,
    files: &dyn FileBoundary,
) -> Result<bool, BoardError> {
    let Some(text) = files.open_file(FileFilter::Json)? else {
        return Ok(false);
    };
    import_json(doc, &text)?;
    Ok(true)
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BoardError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Edge not found: {0}")]
    EdgeNotFound(String),

    #[error("Board already has a node imported from source '{0}'")]
    DuplicateSource(String),

    #[error("Invalid board file: {0}")]
    ImportValidation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

use crate::error::BoardError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpacing {
    pub x: f64,
    pub y: f64,
}

/// Engine tuning knobs. Every field falls back to its default when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Entries kept on each of the undo and redo stacks.
    pub history_limit: usize,
    /// Settle delay of the trailing save timer.
    pub save_delay_ms: u64,
    /// Offset applied on both axes to pasted nodes.
    pub paste_offset: f64,
    /// Cell size of the import grid.
    pub import_spacing: GridSpacing,
}

impl Default for BoardConfig {
    fn default() -> Self {
        BoardConfig {
            history_limit: 50,
            save_delay_ms: 1000,
            paste_offset: 40.0,
            import_spacing: GridSpacing { x: 240.0, y: 160.0 },
        }
    }
}

impl BoardConfig {
    pub fn load(path: &Path) -> Result<Self, BoardError> {
        debug!(path = %path.display(), "loading board config");
        let data = std::fs::read_to_string(path)?;
        let config: BoardConfig = serde_json::from_str(&data)?;
        Ok(config)
    }

    pub fn save_delay(&self) -> Duration {
        Duration::from_millis(self.save_delay_ms)
    }
}

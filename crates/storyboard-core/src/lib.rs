//! Graph board engine: a node-and-edge story board with undo/redo, a
//! clipboard, debounced persistence and JSON/image import-export.

pub mod boundary;
pub mod clipboard;
pub mod config;
mod document;
pub mod error;
pub mod export;
pub mod history;
pub mod import;
pub mod model;
pub mod notice;
pub mod persistence;
pub mod session;

#[cfg(test)]
mod testing;

pub use config::BoardConfig;
pub use error::BoardError;
pub use session::BoardSession;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("storyboard_core=info"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .init();
    });
}

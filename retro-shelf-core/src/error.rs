use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or saving the game library.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Not a system folder: {0}")]
    UnknownSystem(String),

    #[error("Collection '{0}' is read-only")]
    ReadOnly(String),
}

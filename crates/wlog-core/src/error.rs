//! Error types for log loading and export.

use thiserror::Error;

/// Errors surfaced at the engine boundary.
///
/// Malformed records never produce an error; they are skipped and counted.
/// Only a document that cannot be read at all, or a sink that cannot be
/// written, is reported here.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("invalid log JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

//! Execution error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the execution layer itself.
///
/// Step failures never appear here; they are recorded on the summary.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Summary could not be serialized
    #[error("Summary serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Summary file could not be written
    #[error("Failed to write summary to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

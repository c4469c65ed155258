//! Fatal errors of an operator run
//!
//! Anything here aborts the run before or instead of execution. Step and
//! capture failures never reach this type; they are recorded on the summary.

use std::path::PathBuf;

use cdp_adapter::SurfaceError;
use operator_core_types::PlanFormatError;
use operator_llm::CompletionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OperatorError {
    /// Plan generation failed after retries and fallback
    #[error("plan generation failed: {0}")]
    Completion(#[from] CompletionError),

    /// Plan text could not be read as a plan
    #[error("invalid plan: {0}")]
    PlanFormat(#[from] PlanFormatError),

    /// Configuration file is unreadable or malformed
    #[error("invalid configuration in {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// Browser session could not be started
    #[error("automation surface unavailable: {0}")]
    Surface(#[from] SurfaceError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl OperatorError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type OperatorResult<T> = Result<T, OperatorError>;

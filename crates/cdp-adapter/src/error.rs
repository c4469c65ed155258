use thiserror::Error;

/// Failure of a single surface operation.
///
/// Inside the execution engine every variant is a per-step failure; none of
/// them aborts a run.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("{action} requires a target selector")]
    MissingTarget { action: &'static str },

    #[error("{action} requires a value")]
    MissingValue { action: &'static str },

    #[error("invalid wait duration: {0}")]
    InvalidDuration(String),

    #[error("no element matches selector `{0}`")]
    NotFound(String),

    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u128,
    },

    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error("browser driver error: {0}")]
    Driver(String),

    #[error("automation session already closed")]
    Closed,
}

impl From<chromiumoxide::error::CdpError> for SurfaceError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        Self::Driver(err.to_string())
    }
}

///! Error types for debug capture
use cdp_adapter::SurfaceError;
use std::fmt;

#[derive(Debug)]
pub enum CaptureError {
    /// The surface could not produce a snapshot, markup or element box
    Surface(SurfaceError),

    /// Decoding, drawing or encoding the snapshot failed
    Image(image::ImageError),

    /// Background image task panicked or was cancelled
    Task(String),

    /// IO error
    Io(std::io::Error),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Surface(err) => write!(f, "surface error: {}", err),
            Self::Image(err) => write!(f, "image processing error: {}", err),
            Self::Task(msg) => write!(f, "image task failed: {}", msg),
            Self::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for CaptureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Surface(err) => Some(err),
            Self::Image(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Task(_) => None,
        }
    }
}

impl From<SurfaceError> for CaptureError {
    fn from(err: SurfaceError) -> Self {
        Self::Surface(err)
    }
}

impl From<std::io::Error> for CaptureError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<image::ImageError> for CaptureError {
    fn from(err: image::ImageError) -> Self {
        Self::Image(err)
    }
}

impl From<tokio::task::JoinError> for CaptureError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}

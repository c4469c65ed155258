//! Visual Perceiver - best-effort debug capture for plan steps
//!
//! After every step the capture unit:
//! - saves a PNG snapshot of the surface
//! - saves the page markup next to it
//! - optionally outlines the step's target element on the snapshot
//!
//! Nothing in here ever fails a step: problems are logged and recorded on the
//! returned [`ExecutionArtifact`].

pub mod annotate;
pub mod capture;
pub mod errors;
pub mod models;

// Re-exports
pub use annotate::{outline_region, OutlineStyle};
pub use capture::{ArtifactCapture, DebugCapture};
pub use errors::CaptureError;
pub use models::{CaptureIssue, CaptureOptions, CaptureStage, ExecutionArtifact};

///! Data models for debug capture
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::annotate::OutlineStyle;

/// `strftime` pattern embedded in artifact file names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Where and how artifacts are written.
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    /// Artifacts directory, created on first capture
    pub artifacts_dir: PathBuf,

    /// Outline the step's target element on its snapshot
    pub annotate: bool,

    pub outline: OutlineStyle,
}

impl CaptureOptions {
    pub fn new(artifacts_dir: impl Into<PathBuf>) -> Self {
        Self {
            artifacts_dir: artifacts_dir.into(),
            annotate: true,
            outline: OutlineStyle::default(),
        }
    }

    pub fn with_annotation(mut self, annotate: bool) -> Self {
        self.annotate = annotate;
        self
    }

    pub fn with_outline(mut self, outline: OutlineStyle) -> Self {
        self.outline = outline;
        self
    }

    /// `{dir}/step{index}_{timestamp}.png`
    pub fn snapshot_path(&self, step_index: usize, timestamp: &str) -> PathBuf {
        self.artifacts_dir
            .join(format!("step{step_index}_{timestamp}.png"))
    }

    /// `{dir}/step{index}_{timestamp}.html`
    pub fn dump_path(&self, step_index: usize, timestamp: &str) -> PathBuf {
        self.artifacts_dir
            .join(format!("step{step_index}_{timestamp}.html"))
    }
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self::new("logs")
    }
}

/// Part of a capture that went wrong.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CaptureStage {
    Directory,
    Snapshot,
    Dump,
    Annotate,
}

impl fmt::Display for CaptureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Directory => "directory",
            Self::Snapshot => "snapshot",
            Self::Dump => "dump",
            Self::Annotate => "annotate",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaptureIssue {
    pub stage: CaptureStage,
    pub message: String,
}

/// Debug artifact produced for one step, whatever the step's outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionArtifact {
    pub step_index: usize,

    /// Timestamp shared by both file names
    pub timestamp: String,

    /// Snapshot file, `None` when the snapshot could not be taken or written
    pub snapshot_path: Option<PathBuf>,

    /// Markup dump file, `None` when retrieval or writing failed
    pub dump_path: Option<PathBuf>,

    /// Whether the snapshot carries an element outline
    pub annotated: bool,

    /// Problems encountered along the way; logged as warnings when recorded
    pub issues: Vec<CaptureIssue>,
}

impl ExecutionArtifact {
    pub fn new(step_index: usize, timestamp: impl Into<String>) -> Self {
        Self {
            step_index,
            timestamp: timestamp.into(),
            snapshot_path: None,
            dump_path: None,
            annotated: false,
            issues: Vec::new(),
        }
    }

    pub fn snapshot(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    pub fn dump(&self) -> Option<&Path> {
        self.dump_path.as_deref()
    }

    pub fn is_complete(&self) -> bool {
        self.snapshot_path.is_some() && self.dump_path.is_some()
    }

    pub fn has_issue(&self, stage: CaptureStage) -> bool {
        self.issues.iter().any(|issue| issue.stage == stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_names_carry_index_and_timestamp() {
        let options = CaptureOptions::new("logs");
        assert_eq!(
            options.snapshot_path(2, "20240101_120000"),
            PathBuf::from("logs/step2_20240101_120000.png")
        );
        assert_eq!(
            options.dump_path(2, "20240101_120000"),
            PathBuf::from("logs/step2_20240101_120000.html")
        );
    }
}

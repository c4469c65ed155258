//! Execution records and run summaries

use crate::errors::FlowError;
use chrono::{DateTime, Local, Utc};
use perceiver_visual::models::TIMESTAMP_FORMAT;
use perceiver_visual::ExecutionArtifact;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Outcome of one step's dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum StepOutcome {
    Succeeded,
    /// Dispatch raised; carries the error message
    Failed(String),
}

impl StepOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Succeeded => None,
            Self::Failed(reason) => Some(reason),
        }
    }
}

/// Step execution record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    /// 1-based position in the plan
    pub index: usize,

    /// Action tag as written in the plan
    pub action: String,

    /// One-line rendering of the step
    pub description: String,

    pub outcome: StepOutcome,

    /// Debug capture taken after dispatch
    pub artifact: ExecutionArtifact,

    /// Start time
    pub started_at: DateTime<Utc>,

    /// Finish time, including capture
    pub finished_at: DateTime<Utc>,

    /// Latency in milliseconds
    pub latency_ms: u64,
}

/// Result of a whole plan run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub run_id: String,

    pub started_at: DateTime<Utc>,

    pub finished_at: DateTime<Utc>,

    /// One record per executed step, in execution order
    pub steps: Vec<StepRecord>,

    /// Set when cancellation stopped the run before its last step
    pub cancelled: bool,
}

impl ExecutionSummary {
    /// Create an empty summary stamped with a fresh run id
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4().to_string(),
            started_at: now,
            finished_at: now,
            steps: Vec::new(),
            cancelled: false,
        }
    }

    pub fn record(&mut self, record: StepRecord) {
        self.steps.push(record);
    }

    /// Set finish time
    pub fn finish(&mut self) {
        self.finished_at = Utc::now();
    }

    pub fn total(&self) -> usize {
        self.steps.len()
    }

    pub fn succeeded(&self) -> usize {
        self.steps
            .iter()
            .filter(|record| record.outcome.is_success())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    /// No step failed and the run was not cut short
    pub fn is_success(&self) -> bool {
        self.failed() == 0 && !self.cancelled
    }

    pub fn latency_ms(&self) -> u64 {
        (self.finished_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64
    }

    /// Writes the summary as pretty JSON to `{dir}/summary_<timestamp>.json`.
    pub async fn write_json(&self, dir: &Path) -> Result<PathBuf, FlowError> {
        let body = serde_json::to_vec_pretty(self)?;
        let timestamp = Local::now().format(TIMESTAMP_FORMAT);
        let path = dir.join(format!("summary_{timestamp}.json"));

        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| FlowError::Write {
                path: path.clone(),
                source,
            })?;
        tokio::fs::write(&path, body)
            .await
            .map_err(|source| FlowError::Write {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}

impl Default for ExecutionSummary {
    fn default() -> Self {
        Self::new()
    }
}

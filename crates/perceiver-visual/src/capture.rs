///! Per-step debug capture
use std::fmt::Display;
use std::path::Path;

use async_trait::async_trait;
use cdp_adapter::AutomationSurface;
use chrono::Local;
use tracing::{debug, info, warn};

use crate::annotate::annotate_file;
use crate::errors::CaptureError;
use crate::models::{CaptureIssue, CaptureOptions, CaptureStage, ExecutionArtifact, TIMESTAMP_FORMAT};

/// Records the surface state after a step.
///
/// Implementations never fail: every problem is logged and kept on the
/// returned artifact so the run can carry on.
#[async_trait]
pub trait DebugCapture: Send + Sync {
    async fn capture(
        &self,
        surface: &mut dyn AutomationSurface,
        step_index: usize,
        selector: Option<&str>,
    ) -> ExecutionArtifact;
}

/// Writes snapshot and markup files under the artifacts directory.
#[derive(Debug, Clone, Default)]
pub struct ArtifactCapture {
    options: CaptureOptions,
}

impl ArtifactCapture {
    pub fn new(options: CaptureOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CaptureOptions {
        &self.options
    }

    async fn save_snapshot(
        &self,
        surface: &mut dyn AutomationSurface,
        path: &Path,
    ) -> Result<(), CaptureError> {
        let png = surface.snapshot().await?;
        tokio::fs::write(path, png).await?;
        Ok(())
    }

    async fn save_dump(
        &self,
        surface: &mut dyn AutomationSurface,
        path: &Path,
    ) -> Result<(), CaptureError> {
        let markup = surface.content().await?;
        tokio::fs::write(path, markup).await?;
        Ok(())
    }

    async fn outline(
        &self,
        surface: &mut dyn AutomationSurface,
        snapshot: &Path,
        selector: &str,
    ) -> Result<bool, CaptureError> {
        let Some(region) = surface.locate(selector).await? else {
            debug!(selector, "No element to outline");
            return Ok(false);
        };
        let drawn = annotate_file(snapshot, region, self.options.outline).await?;
        if !drawn {
            debug!(selector, "Element box lies outside the snapshot");
        }
        Ok(drawn)
    }
}

fn record(artifact: &mut ExecutionArtifact, stage: CaptureStage, err: impl Display) {
    warn!(
        step = artifact.step_index,
        stage = %stage,
        error = %err,
        "Debug capture incomplete"
    );
    artifact.issues.push(CaptureIssue {
        stage,
        message: err.to_string(),
    });
}

#[async_trait]
impl DebugCapture for ArtifactCapture {
    async fn capture(
        &self,
        surface: &mut dyn AutomationSurface,
        step_index: usize,
        selector: Option<&str>,
    ) -> ExecutionArtifact {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let mut artifact = ExecutionArtifact::new(step_index, timestamp.clone());

        if let Err(err) = tokio::fs::create_dir_all(&self.options.artifacts_dir).await {
            record(&mut artifact, CaptureStage::Directory, err);
        }

        let snapshot_path = self.options.snapshot_path(step_index, &timestamp);
        match self.save_snapshot(surface, &snapshot_path).await {
            Ok(()) => {
                info!(step = step_index, path = %snapshot_path.display(), "Saved snapshot");
                artifact.snapshot_path = Some(snapshot_path);
            }
            Err(err) => record(&mut artifact, CaptureStage::Snapshot, err),
        }

        let dump_path = self.options.dump_path(step_index, &timestamp);
        match self.save_dump(surface, &dump_path).await {
            Ok(()) => {
                info!(step = step_index, path = %dump_path.display(), "Saved markup dump");
                artifact.dump_path = Some(dump_path);
            }
            Err(err) => record(&mut artifact, CaptureStage::Dump, err),
        }

        if !self.options.annotate {
            return artifact;
        }
        if let (Some(selector), Some(snapshot)) = (selector, artifact.snapshot_path.clone()) {
            match self.outline(surface, &snapshot, selector).await {
                Ok(drawn) => artifact.annotated = drawn,
                Err(err) => record(&mut artifact, CaptureStage::Annotate, err),
            }
        }

        artifact
    }
}

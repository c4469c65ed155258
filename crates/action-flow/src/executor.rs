//! Plan executor implementation

use crate::types::{ExecutionSummary, StepOutcome, StepRecord};
use cdp_adapter::{AutomationSurface, SurfaceError};
use chrono::Utc;
use operator_core_types::{Plan, Step, StepAction};
use perceiver_visual::DebugCapture;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Runs plans step by step against an automation surface.
pub struct PlanExecutor {
    capture: Arc<dyn DebugCapture>,
    cancel: Option<CancellationToken>,
}

impl PlanExecutor {
    /// Create a new executor
    pub fn new(capture: Arc<dyn DebugCapture>) -> Self {
        Self {
            capture,
            cancel: None,
        }
    }

    /// Stop starting new steps once `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(CancellationToken::is_cancelled)
            .unwrap_or(false)
    }

    /// Executes every step of `plan` in order, then closes `surface`.
    ///
    /// Step failures are recorded on the summary and never stop the run. The
    /// surface is owned by the run and closed exactly once, after the last
    /// step or after cancellation.
    pub async fn run<S>(&self, plan: &Plan, mut surface: S) -> ExecutionSummary
    where
        S: AutomationSurface,
    {
        let total = plan.len();
        let mut summary = ExecutionSummary::new();
        info!(run_id = %summary.run_id, steps = total, "Starting plan execution");

        for (offset, step) in plan.iter().enumerate() {
            let index = offset + 1;
            if self.cancelled() {
                warn!(
                    step = index,
                    remaining = total - offset,
                    "Execution cancelled; skipping remaining steps"
                );
                summary.cancelled = true;
                break;
            }

            let record = self.execute_step(&mut surface, index, total, step).await;
            summary.record(record);
        }

        if let Err(err) = surface.close().await {
            warn!(error = %err, "Failed to close automation surface");
        }

        summary.finish();
        info!(
            run_id = %summary.run_id,
            succeeded = summary.succeeded(),
            failed = summary.failed(),
            cancelled = summary.cancelled,
            latency_ms = summary.latency_ms(),
            "Plan execution finished"
        );
        summary
    }

    /// Dispatch, capture and record one step
    async fn execute_step<S>(
        &self,
        surface: &mut S,
        index: usize,
        total: usize,
        step: &Step,
    ) -> StepRecord
    where
        S: AutomationSurface,
    {
        let started_at = Utc::now();
        let description = step.describe();
        info!(step = index, total, action = %description, "Executing step");

        let outcome = match dispatch(surface, step).await {
            Ok(()) => {
                info!(step = index, "Step succeeded");
                StepOutcome::Succeeded
            }
            Err(err) => {
                error!(step = index, error = %err, "Step failed");
                StepOutcome::Failed(err.to_string())
            }
        };

        let artifact = self
            .capture
            .capture(surface, index, step.annotation_selector())
            .await;
        debug!(
            step = index,
            snapshot = artifact.snapshot_path.is_some(),
            dump = artifact.dump_path.is_some(),
            annotated = artifact.annotated,
            issues = artifact.issues.len(),
            "Step captured"
        );

        let finished_at = Utc::now();
        StepRecord {
            index,
            action: step.action().tag().to_string(),
            description,
            outcome,
            artifact,
            started_at,
            finished_at,
            latency_ms: (finished_at - started_at).num_milliseconds().max(0) as u64,
        }
    }
}

/// Maps one step onto the surface call its action names.
async fn dispatch<S>(surface: &mut S, step: &Step) -> Result<(), SurfaceError>
where
    S: AutomationSurface,
{
    match step.action() {
        StepAction::Navigate => {
            let url = step
                .navigation_url()
                .ok_or(SurfaceError::MissingTarget { action: "goto" })?;
            surface.navigate(url).await
        }

        StepAction::Click => {
            let selector = step
                .target()
                .ok_or(SurfaceError::MissingTarget { action: "click" })?;
            surface.click(selector).await
        }

        StepAction::Fill => {
            let selector = step
                .target()
                .ok_or(SurfaceError::MissingTarget { action: "fill" })?;
            let value = step
                .value()
                .ok_or(SurfaceError::MissingValue { action: "fill" })?;
            surface.fill(selector, value).await
        }

        StepAction::Wait => {
            let seconds = step.wait_seconds();
            let duration = Duration::try_from_secs_f64(seconds)
                .map_err(|_| SurfaceError::InvalidDuration(seconds.to_string()))?;
            surface.wait(duration).await
        }

        StepAction::Unknown(tag) => {
            warn!(action = %tag, "Unknown action; skipping driver call");
            Ok(())
        }
    }
}

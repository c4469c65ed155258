//! Planner and runner wiring shared by the binary and integration tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use action_flow::{ExecutionSummary, PlanExecutor};
use cdp_adapter::AutomationSurface;
use chrono::Utc;
use operator_core_types::{parse_plan, Plan};
use operator_llm::{OpenAiTransport, PlanGenerator, ResilientCompletionClient};
use perceiver_visual::ArtifactCapture;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{ArtifactSettings, LlmSettings};
use crate::errors::{OperatorError, OperatorResult};

/// `plan_<unix_seconds>.yml`
pub fn plan_file_name(unix_seconds: i64) -> String {
    format!("plan_{unix_seconds}.yml")
}

/// Builds the generator backed by the OpenAI-compatible transport.
pub fn build_generator(
    settings: &LlmSettings,
    api_key: Option<String>,
    cancel: Option<CancellationToken>,
) -> OperatorResult<PlanGenerator> {
    let transport = OpenAiTransport::new(settings.transport_config(api_key))?;
    let mut client = ResilientCompletionClient::new(Arc::new(transport))
        .with_models(&settings.primary_model, &settings.fallback_model)
        .with_policy(settings.retry_policy());
    if let Some(token) = cancel {
        client = client.with_cancellation(token);
    }
    Ok(PlanGenerator::new(client))
}

/// Writes raw plan text to `path`, creating parent directories.
pub async fn write_plan(text: &str, path: &Path) -> OperatorResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|err| OperatorError::io(parent, err))?;
    }
    tokio::fs::write(path, text)
        .await
        .map_err(|err| OperatorError::io(path, err))
}

/// Persists raw plan text under `dir` with a timestamped name.
pub async fn persist_plan(text: &str, dir: &Path) -> OperatorResult<PathBuf> {
    let path = dir.join(plan_file_name(Utc::now().timestamp()));
    write_plan(text, &path).await?;
    Ok(path)
}

pub async fn load_plan_file(path: &Path) -> OperatorResult<Plan> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|err| OperatorError::io(path, err))?;
    let plan = parse_plan(&text)?;
    info!(path = %path.display(), steps = plan.len(), "Loaded plan file");
    Ok(plan)
}

/// Runs `plan` on `surface` and persists the summary next to the artifacts.
///
/// Never fails: step problems live on the summary and a summary that cannot
/// be written is only logged.
pub async fn execute_plan<S>(
    plan: &Plan,
    surface: S,
    settings: &ArtifactSettings,
    cancel: Option<CancellationToken>,
) -> ExecutionSummary
where
    S: AutomationSurface,
{
    let capture = Arc::new(ArtifactCapture::new(settings.capture_options()));
    let mut executor = PlanExecutor::new(capture);
    if let Some(token) = cancel {
        executor = executor.with_cancellation(token);
    }

    let summary = executor.run(plan, surface).await;
    for record in summary.steps.iter().filter(|r| !r.outcome.is_success()) {
        warn!(
            step = record.index,
            action = %record.description,
            reason = record.outcome.reason().unwrap_or_default(),
            "Step did not succeed"
        );
    }

    match summary.write_json(&settings.dir).await {
        Ok(path) => info!(path = %path.display(), "Execution summary written"),
        Err(err) => warn!(error = %err, "Failed to write execution summary"),
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn plan_files_are_named_by_unix_time() {
        assert_eq!(plan_file_name(1_700_000_000), "plan_1700000000.yml");
    }

    #[tokio::test]
    async fn persisted_plan_keeps_raw_text() {
        let dir = TempDir::new().unwrap();
        let raw = "```yaml\nsteps:\n  - action: goto\n    url: https://example.test\n```\n";

        let path = persist_plan(raw, &dir.path().join("plans")).await.unwrap();

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("plan_") && name.ends_with(".yml"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), raw);

        let plan = load_plan_file(&path).await.unwrap();
        assert_eq!(plan.len(), 1);
    }

    #[tokio::test]
    async fn unreadable_plan_file_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let err = load_plan_file(&dir.path().join("absent.yml"))
            .await
            .unwrap_err();
        assert!(matches!(err, OperatorError::Io { .. }));
    }

    #[tokio::test]
    async fn malformed_plan_file_is_a_format_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plan.yml");
        std::fs::write(&path, "just some prose").unwrap();

        let err = load_plan_file(&path).await.unwrap_err();
        assert!(matches!(err, OperatorError::PlanFormat(_)));
    }

    #[test]
    fn generator_uses_configured_models() {
        let settings = LlmSettings {
            primary_model: "primary".into(),
            fallback_model: "fallback".into(),
            retries: 1,
            ..LlmSettings::default()
        };
        let generator = build_generator(&settings, None, None).unwrap();
        assert_eq!(generator.client().primary_model(), "primary");
        assert_eq!(generator.client().fallback_model(), "fallback");
        assert_eq!(generator.client().policy().retries, 1);
    }
}

use anyhow::{bail, Context, Result};
use action_flow::ExecutionSummary;
use cdp_adapter::ChromiumSurface;
use operator_core_types::parse_plan;
use plan_operator::workflow::{self, build_generator};
use plan_operator::OperatorConfig;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::CliArgs;

/// Plans and/or executes according to the command line.
///
/// Returns `None` in plan-only mode.
pub async fn cmd_operate(
    args: &CliArgs,
    config: &OperatorConfig,
    api_key: Option<String>,
    cancel: CancellationToken,
) -> Result<Option<ExecutionSummary>> {
    let plan = match (&args.plan_file, &args.instruction) {
        (Some(path), _) => workflow::load_plan_file(path)
            .await
            .context("Failed to load plan file")?,
        (None, Some(instruction)) => {
            let generator = build_generator(&config.llm, api_key, Some(cancel.clone()))?;
            let text = generator
                .generate(instruction)
                .await
                .context("Plan generation failed")?;

            let saved = match &args.output {
                Some(path) => workflow::write_plan(&text, path).await.map(|_| path.clone()),
                None => workflow::persist_plan(&text, &config.artifacts.plans_dir).await,
            }
            .context("Failed to save generated plan")?;
            info!(path = %saved.display(), "Plan saved");

            if args.plan_only {
                return Ok(None);
            }
            parse_plan(&text).context("Generated plan is not valid")?
        }
        (None, None) => bail!("an instruction or --plan-file is required"),
    };
    info!(steps = plan.len(), "Plan ready");

    let surface = ChromiumSurface::launch(&config.browser)
        .await
        .context("Failed to launch browser")?;
    let summary =
        workflow::execute_plan(&plan, surface, &config.artifacts, Some(cancel)).await;
    Ok(Some(summary))
}

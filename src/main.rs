mod cli;

use anyhow::Result;
use clap::Parser;
use plan_operator::config::ENV_API_KEY;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::cli::run::cmd_operate;
use crate::cli::runtime::{init_logging, load_config};
use crate::cli::CliArgs;

/// Exit status when `--fail-on-step-error` is set and a step failed.
const EXIT_STEP_FAILURE: i32 = 2;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CliArgs::parse();
    let api_key = std::env::var(ENV_API_KEY).ok();

    let mut loaded = load_config(cli.config.as_ref()).await?;
    cli.apply_to(&mut loaded.config);
    let guard = init_logging(&loaded.config.logging, cli.debug)?;

    info!("Starting plan operator v{}", env!("CARGO_PKG_VERSION"));
    loaded.log_source();

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; stopping after the current step");
            interrupt.cancel();
        }
    });

    let code = match cmd_operate(&cli, &loaded.config, api_key, cancel).await {
        Ok(None) => {
            info!("Plan generated");
            0
        }
        Ok(Some(summary)) => {
            info!(
                succeeded = summary.succeeded(),
                failed = summary.failed(),
                total = summary.total(),
                "Run complete"
            );
            if cli.fail_on_step_error && !summary.is_success() {
                EXIT_STEP_FAILURE
            } else {
                0
            }
        }
        Err(e) => {
            error!("Operator failed: {:#}", e);
            1
        }
    };

    // process::exit skips destructors; flush the log file first.
    drop(guard);
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

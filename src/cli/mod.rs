pub mod run;
pub mod runtime;

use clap::{ArgGroup, Parser};
use std::path::PathBuf;

use plan_operator::OperatorConfig;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("OPERATOR_GIT_HASH"),
    ", built ",
    env!("OPERATOR_BUILD_DATE"),
    ")"
);

/// Generate a browser automation plan from an instruction and run it.
#[derive(Parser, Debug)]
#[command(author, version, long_version = LONG_VERSION, about, long_about = None)]
#[command(group(ArgGroup::new("source").required(true).args(["instruction", "plan_file"])))]
pub struct CliArgs {
    /// Natural-language instruction to plan and execute
    #[arg(value_name = "INSTRUCTION")]
    pub instruction: Option<String>,

    /// Execute an existing plan file instead of generating one
    #[arg(long, value_name = "FILE", conflicts_with = "instruction")]
    pub plan_file: Option<PathBuf>,

    /// Generate and save the plan without executing it
    #[arg(long, requires = "instruction")]
    pub plan_only: bool,

    /// Where to save the generated plan (default: timestamped file in the plans dir)
    #[arg(short, long, value_name = "FILE", requires = "instruction")]
    pub output: Option<PathBuf>,

    /// Run the browser without a window
    #[arg(long)]
    pub headless: bool,

    /// Directory for snapshots, markup dumps and run summaries
    #[arg(long, value_name = "DIR")]
    pub artifacts_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level (overrides the configuration file)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long)]
    pub debug: bool,

    /// Exit with a non-zero status when any step failed
    #[arg(long)]
    pub fail_on_step_error: bool,
}

impl CliArgs {
    /// Flags take precedence over file and environment settings.
    pub fn apply_to(&self, config: &mut OperatorConfig) {
        if self.headless {
            config.browser.headless = true;
        }
        if let Some(dir) = &self.artifacts_dir {
            config.artifacts.dir = dir.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn instruction_or_plan_file_is_required() {
        let err = CliArgs::try_parse_from(["operator"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn instruction_and_plan_file_conflict() {
        let err = CliArgs::try_parse_from(["operator", "open it", "--plan-file", "plan.yml"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn plan_only_needs_an_instruction() {
        assert!(CliArgs::try_parse_from(["operator", "--plan-only", "--plan-file", "p.yml"]).is_err());
        let args = CliArgs::try_parse_from(["operator", "--plan-only", "open example.test"]).unwrap();
        assert!(args.plan_only);
        assert_eq!(args.instruction.as_deref(), Some("open example.test"));
    }

    #[test]
    fn flags_override_configuration() {
        let args = CliArgs::try_parse_from([
            "operator",
            "--plan-file",
            "plan.yml",
            "--headless",
            "--artifacts-dir",
            "out",
            "--log-level",
            "warn",
        ])
        .unwrap();
        let mut config = OperatorConfig::default();
        args.apply_to(&mut config);

        assert!(config.browser.headless);
        assert_eq!(config.artifacts.dir, PathBuf::from("out"));
        assert_eq!(config.logging.level, "warn");
    }
}

//! Operator configuration
//!
//! Read from YAML; every section and field is optional. Environment variables
//! override the file, command-line flags override both.

use std::path::{Path, PathBuf};
use std::time::Duration;

use cdp_adapter::SurfaceConfig;
use operator_llm::openai::DEFAULT_API_BASE;
use operator_llm::{OpenAiConfig, RetryPolicy, DEFAULT_FALLBACK_MODEL, DEFAULT_PRIMARY_MODEL};
use perceiver_visual::{CaptureOptions, OutlineStyle};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::{OperatorError, OperatorResult};

pub const ENV_HEADLESS: &str = "OPERATOR_HEADLESS";
pub const ENV_ARTIFACTS_DIR: &str = "OPERATOR_ARTIFACTS_DIR";
pub const ENV_PRIMARY_MODEL: &str = "OPERATOR_PRIMARY_MODEL";
pub const ENV_FALLBACK_MODEL: &str = "OPERATOR_FALLBACK_MODEL";
pub const ENV_API_BASE: &str = "OPENAI_API_BASE";
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorConfig {
    pub llm: LlmSettings,
    pub browser: SurfaceConfig,
    pub artifacts: ArtifactSettings,
    pub logging: LoggingSettings,
}

/// Completion service and retry schedule.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub api_base: String,
    pub primary_model: String,
    pub fallback_model: String,
    /// Retries after the first primary attempt; the primary model is tried
    /// `retries + 1` times before the single fallback request.
    pub retries: u32,
    pub backoff_base: f64,
    pub max_jitter_secs: f64,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            primary_model: DEFAULT_PRIMARY_MODEL.to_string(),
            fallback_model: DEFAULT_FALLBACK_MODEL.to_string(),
            retries: 3,
            backoff_base: 1.5,
            max_jitter_secs: 0.5,
            timeout_secs: 60,
        }
    }
}

impl LlmSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.retries,
            backoff_base: self.backoff_base,
            max_jitter: Duration::try_from_secs_f64(self.max_jitter_secs).unwrap_or(Duration::ZERO),
        }
    }

    pub fn transport_config(&self, api_key: Option<String>) -> OpenAiConfig {
        OpenAiConfig {
            api_key,
            api_base: self.api_base.clone(),
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
        }
    }
}

/// Debug artifacts and generated plan files.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactSettings {
    pub dir: PathBuf,
    pub annotate: bool,
    pub outline_width: u32,
    /// Where generated plans are persisted
    pub plans_dir: PathBuf,
}

impl Default for ArtifactSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
            annotate: true,
            outline_width: 3,
            plans_dir: PathBuf::from("."),
        }
    }
}

impl ArtifactSettings {
    pub fn capture_options(&self) -> CaptureOptions {
        CaptureOptions::new(&self.dir)
            .with_annotation(self.annotate)
            .with_outline(OutlineStyle {
                width: self.outline_width,
                ..OutlineStyle::default()
            })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub file: PathBuf,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: PathBuf::from("operator.log"),
        }
    }
}

impl OperatorConfig {
    pub fn from_yaml_str(raw: &str, origin: &Path) -> OperatorResult<Self> {
        // An empty file parses as YAML null.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).map_err(|err| OperatorError::Config {
            path: origin.to_path_buf(),
            message: err.to_string(),
        })
    }

    pub async fn load(path: &Path) -> OperatorResult<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|err| OperatorError::io(path, err))?;
        Self::from_yaml_str(&raw, path)
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from `lookup`, skipping empty values.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(raw) = get(ENV_HEADLESS) {
            match parse_flag(&raw) {
                Some(headless) => self.browser.headless = headless,
                None => warn!(key = ENV_HEADLESS, value = %raw, "Ignoring non-boolean override"),
            }
        }
        if let Some(dir) = get(ENV_ARTIFACTS_DIR) {
            self.artifacts.dir = PathBuf::from(dir);
        }
        if let Some(model) = get(ENV_PRIMARY_MODEL) {
            self.llm.primary_model = model;
        }
        if let Some(model) = get(ENV_FALLBACK_MODEL) {
            self.llm.fallback_model = model;
        }
        if let Some(base) = get(ENV_API_BASE) {
            self.llm.api_base = base;
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Config files tried when no path is given, highest priority first.
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("config").join("operator.yaml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("plan-operator").join("config.yaml"));
    }
    paths
}

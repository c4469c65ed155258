use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use plan_operator::config::{default_config_paths, LoggingSettings};
use plan_operator::OperatorConfig;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs stdout and file logging.
///
/// The returned guard flushes the file writer when dropped; keep it alive for
/// the whole process.
pub fn init_logging(settings: &LoggingSettings, debug: bool) -> Result<WorkerGuard> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        settings.level.parse().context("Invalid log level")?
    };

    let file_name = settings
        .file
        .file_name()
        .context("Log file path has no file name")?;
    let dir = settings
        .file
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string())))
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();

    Ok(guard)
}

/// Where the configuration came from; logged once logging is up.
pub enum ConfigSource {
    File(PathBuf),
    Defaults { searched: Vec<PathBuf> },
}

pub struct LoadedConfig {
    pub config: OperatorConfig,
    pub source: ConfigSource,
}

impl LoadedConfig {
    pub fn log_source(&self) {
        match &self.source {
            ConfigSource::File(path) => {
                info!("Loaded configuration from: {}", path.display())
            }
            ConfigSource::Defaults { searched } => {
                let searched: Vec<String> =
                    searched.iter().map(|p| p.display().to_string()).collect();
                warn!(searched = ?searched, "Config file not found, using defaults");
            }
        }
    }
}

/// Loads the first existing config file, then applies environment overrides.
///
/// Priority: `--config` > `./config/operator.yaml` >
/// `<config_dir>/plan-operator/config.yaml` > defaults.
pub async fn load_config(explicit: Option<&PathBuf>) -> Result<LoadedConfig> {
    let candidates = match explicit {
        Some(path) => vec![path.clone()],
        None => default_config_paths(),
    };

    let mut loaded = LoadedConfig {
        config: OperatorConfig::default(),
        source: ConfigSource::Defaults {
            searched: candidates.clone(),
        },
    };
    if let Some(path) = candidates.into_iter().find(|path| path.exists()) {
        loaded.config = OperatorConfig::load(&path)
            .await
            .context("Failed to load config file")?;
        loaded.source = ConfigSource::File(path);
    }

    loaded.config.apply_env_overrides();
    Ok(loaded)
}

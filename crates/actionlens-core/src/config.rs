use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default location of the configuration file, relative to the repository root.
pub const DEFAULT_CONFIG_PATH: &str = ".actionlens/config.toml";

/// Configuration loaded from `.actionlens/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScanConfig {
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Keep scheduled runs even when they dominate the batch
    #[serde(default)]
    pub include_schedule_runs: bool,

    /// Share of scheduled runs above which they are dropped (0.0-1.0)
    #[serde(default = "default_schedule_ratio_threshold")]
    pub schedule_ratio_threshold: f64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            include_schedule_runs: false,
            schedule_ratio_threshold: default_schedule_ratio_threshold(),
        }
    }
}

fn default_schedule_ratio_threshold() -> f64 {
    0.5
}

/// Load configuration from a TOML file.
pub fn load_config(path: &Path) -> anyhow::Result<ScanConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
    let config: ScanConfig = toml::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e))?;

    if !(0.0..=1.0).contains(&config.history.schedule_ratio_threshold) {
        anyhow::bail!(
            "history.schedule_ratio_threshold must be between 0.0 and 1.0, got {}",
            config.history.schedule_ratio_threshold
        );
    }

    Ok(config)
}

/// Load `.actionlens/config.toml` under `root` if it exists, else defaults.
pub fn load_config_or_default(root: &Path) -> anyhow::Result<ScanConfig> {
    let path = root.join(DEFAULT_CONFIG_PATH);
    if path.exists() {
        tracing::debug!(path = %path.display(), "Loading config");
        load_config(&path)
    } else {
        Ok(ScanConfig::default())
    }
}

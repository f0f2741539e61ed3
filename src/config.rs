//! Configuration file loading.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::discovery::client::DEFAULT_RETRY_TIMEOUT;

const CONFIG_DIR_NAME: &str = "tfdiscover";
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub terraform: TerraformConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TerraformConfig {
    /// Absolute path of the terraform binary; looked up on `PATH` when unset
    pub executable_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Region written into `provider.tf` when the client does not report one
    pub region: Option<String>,
    pub retry_timeout_secs: u64,
    /// Snapshot file used when `--snapshot` is not given
    pub snapshot_path: Option<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            region: None,
            retry_timeout_secs: DEFAULT_RETRY_TIMEOUT.as_secs(),
            snapshot_path: None,
        }
    }
}

impl ExportConfig {
    pub fn retry_timeout(&self) -> Duration {
        Duration::from_secs(self.retry_timeout_secs)
    }
}

/// `$CONFIG_DIR/tfdiscover/config.json`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

pub fn init_from_path(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: Config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(with_env_overrides(config))
}

/// Load the default config file if there is one, else built-in defaults.
pub fn init_default() -> Result<Config, ConfigError> {
    match default_config_path() {
        Some(path) if path.exists() => init_from_path(&path),
        _ => Ok(with_env_overrides(Config::default())),
    }
}

fn with_env_overrides(mut config: Config) -> Config {
    if let Ok(region) = std::env::var("TFDISCOVER_REGION") {
        if !region.is_empty() {
            config.export.region = Some(region);
        }
    }
    config
}

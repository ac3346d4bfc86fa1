//! Configuration file support for podbasal.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/podbasal/config.toml`.

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub clock: ClockConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,
}

/// JSON output configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            pretty: default_pretty(),
        }
    }
}

/// Which wall clock supplies the current time of day
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Timezone {
    #[default]
    Local,
    Utc,
}

/// Clock configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct ClockConfig {
    #[serde(default)]
    pub timezone: Timezone,
}

/// Logging configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Default schedule file, used when none is given on the command line
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct ScheduleConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// Default value functions
fn default_pretty() -> bool {
    true
}

fn default_log_level() -> String {
    "warn".into()
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        match Self::default_config_path() {
            Some(config_path) if config_path.exists() => Self::load_from(&config_path),
            config_path => {
                tracing::info!("No config file found at {:?}, using defaults", config_path);
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|base| base.join("podbasal").join("config.toml"))
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

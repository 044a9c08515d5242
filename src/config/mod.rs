//! Configuration system
//!
//! Handles TOML config file parsing and CLI argument merging.

pub mod builder;
pub mod file;

pub use builder::ConfigBuilder;
pub use file::ConfigFile;

use crate::alerts::AlertConfig;
use crate::error::ConfigError;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,
    /// Evaluators and suppression
    pub alerts: AlertConfig,
}

impl Config {
    /// Reject configuration the engine could not run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.general.validate()?;
        self.alerts.validate()
    }
}

/// General configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log filter used when `--verbose` is not given
    pub log_level: String,
    /// Bound on every snapshot/alert store call, in milliseconds
    pub store_timeout_ms: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            store_timeout_ms: 5000,
        }
    }
}

impl GeneralConfig {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Parsed `log_level`
    pub fn log_level_filter(&self) -> Result<LevelFilter, ConfigError> {
        self.log_level.parse().map_err(|_| {
            ConfigError::invalid(
                "general.log_level",
                format!(
                    "'{}' is not one of off, error, warn, info, debug, trace",
                    self.log_level
                ),
            )
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.log_level_filter()?;
        if self.store_timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "general.store_timeout_ms",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

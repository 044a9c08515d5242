//! Configuration builder
//!
//! Merges configuration from files and CLI arguments.

use crate::config::{Config, ConfigFile};
use crate::error::ConfigError;
use std::path::PathBuf;

/// Builder for merging configuration sources
pub struct ConfigBuilder {
    config: Config,
    source: Option<PathBuf>,
}

impl ConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            source: None,
        }
    }

    /// Load configuration from a file.
    ///
    /// An explicit path must exist; without one the default locations are
    /// searched and built-in defaults apply when none is found.
    pub fn with_file(mut self, path: Option<&str>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                self.config = ConfigFile::load(path)?;
                self.source = Some(PathBuf::from(path));
            }
            None => {
                if let Some((path, config)) = ConfigFile::load_default()? {
                    self.config = config;
                    self.source = Some(path);
                } else {
                    log::debug!("No config file found; using defaults");
                }
            }
        }
        Ok(self)
    }

    /// Override the suppression window
    pub fn with_window(mut self, window_secs: Option<u64>) -> Self {
        if let Some(w) = window_secs {
            self.config.alerts.suppression.window_secs = w;
        }
        self
    }

    /// Override the alerting master switch
    pub fn with_alerts_enabled(mut self, enabled: Option<bool>) -> Self {
        if let Some(e) = enabled {
            self.config.alerts.enabled = e;
        }
        self
    }

    /// File the configuration came from, if any
    pub fn source(&self) -> Option<&PathBuf> {
        self.source.as_ref()
    }

    /// Validate and build the final configuration
    pub fn build(self) -> Result<Config, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_builder_defaults() {
        let config = ConfigBuilder::new().build().unwrap();
        assert!(config.alerts.enabled);
        assert_eq!(config.alerts.suppression.window_secs, 300);
    }

    #[test]
    fn test_builder_overrides() {
        let config = ConfigBuilder::new()
            .with_window(Some(60))
            .with_alerts_enabled(Some(false))
            .build()
            .unwrap();

        assert_eq!(config.alerts.suppression.window_secs, 60);
        assert!(!config.alerts.enabled);
    }

    #[test]
    fn test_builder_rejects_zero_window() {
        assert!(ConfigBuilder::new().with_window(Some(0)).build().is_err());
    }

    #[test]
    fn test_explicit_missing_file_is_fatal() {
        let result = ConfigBuilder::new().with_file(Some("/nonexistent/alertwatch.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_with_file_then_override() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("alertwatch.toml");
        std::fs::write(&path, "[alerts.suppression]\nwindow_secs = 120\n").unwrap();

        let builder = ConfigBuilder::new()
            .with_file(path.to_str())
            .unwrap()
            .with_window(Some(30));
        assert_eq!(builder.source(), Some(&path));

        let config = builder.build().unwrap();
        assert_eq!(config.alerts.suppression.window_secs, 30);
    }
}

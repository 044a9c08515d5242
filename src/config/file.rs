//! Configuration file loading
//!
//! Handles loading configuration from TOML files. String values of the
//! exact form `${NAME}` are replaced with the environment variable `NAME`.

use crate::config::Config;
use crate::error::{ConfigError, Result};

use std::path::{Path, PathBuf};
use toml::Value;

/// Configuration file handler
pub struct ConfigFile;

impl ConfigFile {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> std::result::Result<Config, ConfigError> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound(path.display().to_string()),
            _ => ConfigError::ParseError(format!("cannot read {}: {}", path.display(), e)),
        })?;

        Self::parse(&content)
    }

    /// Parse configuration text
    pub fn parse(content: &str) -> std::result::Result<Config, ConfigError> {
        let raw: Value = toml::from_str(content)?;
        let config: Config = substitute_env(raw).try_into()?;
        Ok(config)
    }

    /// Load the first configuration found in the default locations.
    ///
    /// A file that exists but does not parse is an error, not skipped.
    pub fn load_default() -> std::result::Result<Option<(PathBuf, Config)>, ConfigError> {
        for path in Self::default_paths() {
            if path.exists() {
                let config = Self::load(&path)?;
                log::info!("Loaded config from {}", path.display());
                return Ok(Some((path, config)));
            }
        }
        Ok(None)
    }

    /// Get default configuration file paths, lowest precedence last
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // Current directory
        paths.push(PathBuf::from("alertwatch.toml"));

        // User config
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("alertwatch").join("config.toml"));
        }

        // System-wide config
        paths.push(PathBuf::from("/etc/alertwatch/config.toml"));

        paths
    }

    /// Write configuration as TOML, creating parent directories
    pub fn save<P: AsRef<Path>>(config: &Config, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(config).map_err(ConfigError::from)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}

fn substitute_env(value: Value) -> Value {
    match value {
        Value::String(s) => match placeholder(&s) {
            Some(name) => Value::String(std::env::var(name).unwrap_or_else(|_| {
                log::warn!("Environment variable {} not set", name);
                String::new()
            })),
            None => Value::String(s),
        },
        Value::Array(items) => Value::Array(items.into_iter().map(substitute_env).collect()),
        Value::Table(table) => Value::Table(
            table
                .into_iter()
                .map(|(k, v)| (k, substitute_env(v)))
                .collect(),
        ),
        other => other,
    }
}

fn placeholder(s: &str) -> Option<&str> {
    s.strip_prefix("${")
        .and_then(|rest| rest.strip_suffix('}'))
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_paths_not_empty() {
        let paths = ConfigFile::default_paths();
        assert_eq!(paths.first(), Some(&PathBuf::from("alertwatch.toml")));
        assert!(paths.contains(&PathBuf::from("/etc/alertwatch/config.toml")));
    }

    #[test]
    fn test_load_missing_file() {
        let result = ConfigFile::load("/nonexistent/path/config.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_parse_partial_file() {
        let config = ConfigFile::parse(
            r#"
            [general]
            store_timeout_ms = 250

            [alerts.threshold]
            min = 2.0

            [alerts.suppression]
            window_secs = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.general.store_timeout_ms, 250);
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.alerts.threshold.min, 2.0);
        assert_eq!(config.alerts.threshold.max, 20.0);
        assert_eq!(config.alerts.suppression.window_secs, 60);
        assert_eq!(config.alerts.suppression.max_alerts_per_group, 10);
    }

    #[test]
    fn test_parse_rejects_bad_toml() {
        assert!(matches!(
            ConfigFile::parse("[alerts\nmin = "),
            Err(ConfigError::TomlError(_))
        ));
    }

    #[test]
    fn test_env_substitution() {
        std::env::set_var("ALERTWATCH_TEST_FIELD", "morning_line");
        let config = ConfigFile::parse(
            r#"
            [alerts.threshold]
            field = "${ALERTWATCH_TEST_FIELD}"

            [alerts.secondary]
            field = "${ALERTWATCH_TEST_UNSET_VARIABLE}"
            "#,
        )
        .unwrap();

        assert_eq!(config.alerts.threshold.field, "morning_line");
        assert_eq!(config.alerts.secondary.field, "");
    }

    #[test]
    fn test_placeholder_shape() {
        assert_eq!(placeholder("${HOME}"), Some("HOME"));
        assert_eq!(placeholder("${}"), None);
        assert_eq!(placeholder("prefix ${HOME}"), None);
        assert_eq!(placeholder("plain"), None);
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.alerts.discrepancy.enabled = true;
        ConfigFile::save(&config, &path).unwrap();

        assert_eq!(ConfigFile::load(&path).unwrap(), config);
    }
}

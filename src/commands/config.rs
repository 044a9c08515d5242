//! Config command implementation

use crate::alerts::EvaluatorRegistry;
use crate::cli::args::{ConfigCommands, OutputFormat};
use crate::cli::output::{print_output, ConfigSummary, Message};
use crate::config::{Config, ConfigFile};
use crate::error::{ConfigError, Result};
use std::path::{Path, PathBuf};

/// Execute config commands
pub fn run_config(
    command: &ConfigCommands,
    config: &Config,
    source: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            let summary = ConfigSummary {
                source: source.map(|p| p.display().to_string()),
                config: config.clone(),
            };
            print_output(&summary, format)?;
        }
        ConfigCommands::Check => {
            let registry = EvaluatorRegistry::from_config(&config.alerts)?;
            let message = Message {
                message: format!(
                    "Configuration is valid ({} evaluator(s) enabled)",
                    registry.len()
                ),
                success: true,
            };
            print_output(&message, format)?;
        }
        ConfigCommands::Init { path, force } => {
            let path = init_path(path.as_deref())?;
            if path.exists() && !force {
                return Err(ConfigError::invalid(
                    "path",
                    format!("{} already exists; pass --force to overwrite", path.display()),
                )
                .into());
            }
            ConfigFile::save(&Config::default(), &path)?;
            let message = Message {
                message: format!("Wrote default configuration to {}", path.display()),
                success: true,
            };
            print_output(&message, format)?;
        }
    }
    Ok(())
}

fn init_path(explicit: Option<&Path>) -> std::result::Result<PathBuf, ConfigError> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => dirs::config_dir()
            .map(|dir| dir.join("alertwatch").join("config.toml"))
            .ok_or_else(|| ConfigError::MissingField("path (no user config directory)".to_string())),
    }
}

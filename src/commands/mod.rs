//! Command handlers
//!
//! Each command handler orchestrates the execution of a CLI command.

pub mod config;
pub mod evaluate;
pub mod replay;

pub use config::run_config;
pub use evaluate::run_evaluate;
pub use replay::run_replay;

use crate::domain::Snapshot;
use crate::error::{AppError, Result};
use std::path::Path;

/// Read one snapshot from a JSON file
pub(crate) fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let content = std::fs::read_to_string(path)?;
    parse_snapshot(&content, &path.display().to_string())
}

/// Decode snapshot JSON, naming `source_name` in errors
pub(crate) fn parse_snapshot(content: &str, source_name: &str) -> Result<Snapshot> {
    serde_json::from_str(content).map_err(|e| AppError::InvalidSnapshot {
        source_name: source_name.to_string(),
        message: e.to_string(),
    })
}

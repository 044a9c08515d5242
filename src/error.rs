//! Unified error types for alertwatch
//!
//! This module defines all error types used throughout the application.
//! Uses thiserror for ergonomic error definitions.

use crate::domain::Alert;
use std::time::Duration;
use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from configuration parsing/validation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error from an external store (snapshot history or alert log)
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Error from a snapshot evaluation
    #[error("Evaluation error: {0}")]
    Engine(#[from] EngineError),

    /// Snapshot file could not be decoded
    #[error("Invalid snapshot in {source_name}: {message}")]
    InvalidSnapshot {
        source_name: String,
        message: String,
    },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from reading a measurement field
///
/// Data errors are local to one evaluator/subject pairing and are never
/// retried: re-reading the same snapshot yields the same value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    /// Field is present but cannot be read as a number
    #[error("Malformed field '{field}': {message}")]
    MalformedField { field: String, message: String },
}

/// Errors from the external snapshot and alert stores
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The call did not complete within the configured bound
    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),

    /// The store rejected the call or is unreachable
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Errors from configuration parsing and validation
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Failed to parse config file
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid config value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Missing required config field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerError(#[from] toml::ser::Error),
}

impl ConfigError {
    pub(crate) fn invalid(key: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// Errors from a single `evaluate` call
#[derive(Error, Debug)]
pub enum EngineError {
    /// Alerts were computed but the persistence sink rejected the batch.
    /// The computed alerts are handed back so delivery can be retried
    /// without re-evaluating.
    #[error("Failed to persist {} alert(s): {source}", .alerts.len())]
    Persist {
        alerts: Vec<Alert>,
        #[source]
        source: StoreError,
    },

    /// The caller's deadline passed; no alerts from this call count as produced
    #[error("Evaluation deadline exceeded after {evaluated} of {total} subjects")]
    DeadlineExceeded { evaluated: usize, total: usize },
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

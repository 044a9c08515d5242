//! alertwatch - snapshot alert evaluation and suppression
//!
//! This library compares measurement snapshots against configured
//! thresholds and historical baselines and produces deduplicated alerts.
//!
//! # Modules
//!
//! - [`alerts`]: Evaluators, suppression and the alert engine
//! - [`cli`]: Command-line interface definitions
//! - [`commands`]: Command handlers
//! - [`config`]: Configuration system
//! - [`domain`]: Snapshots, alert candidates and alerts
//! - [`error`]: Error types
//! - [`services`]: Evaluate-then-notify pipeline

pub mod alerts;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::{AppError, Result};

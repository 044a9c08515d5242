//! Alert evaluation and suppression
//!
//! Evaluators turn subject records into candidates, the suppressor withholds
//! duplicates inside a time window and the engine ties both to the external
//! snapshot and alert stores.

mod clock;
mod config;
mod engine;
mod evaluators;
mod notifier;
mod registry;
mod store;
mod suppressor;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    AlertConfig, DiscrepancyConfig, RateOfChangeConfig, SecondaryConfig, SuppressionConfig,
    ThresholdConfig,
};
pub use engine::AlertEngine;
pub use evaluators::{DiscrepancyEvaluator, Evaluator, RateOfChangeEvaluator, ThresholdEvaluator};
pub use notifier::{NotificationManager, Notifier, TerminalNotifier};
pub use registry::{EvaluatorRegistry, Outcome};
pub use store::{AlertStore, MemoryStore, SnapshotSource, TimeoutStore};
pub use suppressor::{SuppressedBy, Suppressor, Verdict};

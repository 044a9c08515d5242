//! Domain models for alertwatch
//!
//! Snapshots come in, alerts go out. Everything in here is plain data;
//! the evaluation logic lives in [`crate::alerts`].

pub mod alert;
pub mod fingerprint;
pub mod snapshot;

pub use alert::{Alert, AlertCandidate, AlertKey, AlertKind, EvaluationContext};
pub use fingerprint::Fingerprint;
pub use snapshot::{MeasurementPoint, Snapshot};

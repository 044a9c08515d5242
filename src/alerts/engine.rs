//! Alert engine
//!
//! Orchestrates one evaluation pass over a snapshot: look up the previous
//! snapshot, run the evaluator registry per subject, filter the triggered
//! candidates through the suppressor and hand the surviving alerts to the
//! store in a single batch.

use super::clock::Clock;
use super::config::AlertConfig;
use super::registry::EvaluatorRegistry;
use super::store::{AlertStore, SnapshotSource};
use super::suppressor::Suppressor;
use crate::domain::{Alert, EvaluationContext, Snapshot};
use crate::error::{ConfigError, EngineError};
use std::sync::Arc;
use std::time::Instant;

/// Snapshot evaluation engine
///
/// Holds no per-call state; everything retained between calls lives in the
/// suppressor's fingerprint cache.
pub struct AlertEngine {
    registry: EvaluatorRegistry,
    suppressor: Suppressor,
    snapshots: Arc<dyn SnapshotSource>,
    store: Arc<dyn AlertStore>,
    max_alerts_per_group: usize,
}

impl AlertEngine {
    /// Build an engine, refusing invalid evaluator configuration
    pub fn new(
        config: &AlertConfig,
        snapshots: Arc<dyn SnapshotSource>,
        store: Arc<dyn AlertStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        let registry = EvaluatorRegistry::from_config(config)?;
        let suppressor = Suppressor::new(config.suppression.window(), Arc::clone(&store), clock);

        Ok(Self {
            registry,
            suppressor,
            snapshots,
            store,
            max_alerts_per_group: config.suppression.max_alerts_per_group,
        })
    }

    pub fn registry(&self) -> &EvaluatorRegistry {
        &self.registry
    }

    pub fn suppressor(&self) -> &Suppressor {
        &self.suppressor
    }

    /// Evaluate a snapshot and persist the resulting alerts.
    ///
    /// Alerts come back in subject order, then evaluator order within a
    /// subject. When the store rejects the batch the computed alerts are
    /// returned inside [`EngineError::Persist`].
    pub fn evaluate(&self, snapshot: &Snapshot) -> Result<Vec<Alert>, EngineError> {
        self.run(snapshot, None)
    }

    /// Like [`evaluate`](Self::evaluate), but abandon the call once `deadline`
    /// passes. An abandoned call produces no alerts and leaves no suppression
    /// entries behind.
    pub fn evaluate_with_deadline(
        &self,
        snapshot: &Snapshot,
        deadline: Instant,
    ) -> Result<Vec<Alert>, EngineError> {
        self.run(snapshot, Some(deadline))
    }

    fn run(&self, snapshot: &Snapshot, deadline: Option<Instant>) -> Result<Vec<Alert>, EngineError> {
        if self.registry.is_empty() || snapshot.is_empty() {
            return Ok(Vec::new());
        }

        let previous = self.previous_snapshot(snapshot);
        let total = snapshot.subjects.len();
        let mut alerts: Vec<Alert> = Vec::new();

        for (index, point) in snapshot.subjects.iter().enumerate() {
            if expired(deadline) {
                return Err(self.abandon(&alerts, index, total));
            }

            let context = EvaluationContext::for_point(snapshot, point);
            let prior = previous.as_ref().and_then(|p| p.matching(point));

            for outcome in self.registry.run(point, prior, &context) {
                let candidate = match outcome.result {
                    Ok(candidate) => candidate,
                    Err(e) => {
                        log::warn!(
                            "Skipping {} evaluator for {} at {}: {}",
                            outcome.evaluator,
                            context.subject_label(),
                            context.group_name,
                            e
                        );
                        continue;
                    }
                };
                if !candidate.should_trigger {
                    continue;
                }

                if self.max_alerts_per_group > 0 && alerts.len() >= self.max_alerts_per_group {
                    log::warn!(
                        "Alert cap ({}) reached for {}; dropping {} for {}",
                        self.max_alerts_per_group,
                        context.group_name,
                        candidate.kind,
                        context.subject_label()
                    );
                    continue;
                }

                if !self.suppressor.check_and_record(&candidate).is_allowed() {
                    continue;
                }

                if let Some(alert) = Alert::from_candidate(&candidate) {
                    log::info!("Alert triggered: {} - {}", alert.kind, alert.message);
                    alerts.push(alert);
                }
            }
        }

        if expired(deadline) {
            return Err(self.abandon(&alerts, total, total));
        }

        if alerts.is_empty() {
            return Ok(alerts);
        }

        if let Err(source) = self.store.save(&alerts) {
            log::error!(
                "Failed to persist {} alert(s) for {}: {}",
                alerts.len(),
                snapshot.group_name,
                source
            );
            return Err(EngineError::Persist { alerts, source });
        }

        log::debug!("Persisted {} alert(s) for {}", alerts.len(), snapshot.group_name);
        Ok(alerts)
    }

    fn previous_snapshot(&self, snapshot: &Snapshot) -> Option<Snapshot> {
        match self.snapshots.previous(snapshot.group_id, snapshot.captured_at) {
            Ok(previous) => previous,
            Err(e) => {
                log::warn!(
                    "Previous snapshot lookup failed for {} (group {}): {}",
                    snapshot.group_name,
                    snapshot.group_id,
                    e
                );
                None
            }
        }
    }

    fn abandon(&self, alerts: &[Alert], evaluated: usize, total: usize) -> EngineError {
        for alert in alerts {
            self.suppressor.release(&alert.fingerprint);
        }
        log::warn!(
            "Evaluation deadline passed after {} of {} subjects; discarding {} alert(s)",
            evaluated,
            total,
            alerts.len()
        );
        EngineError::DeadlineExceeded { evaluated, total }
    }
}

fn expired(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}

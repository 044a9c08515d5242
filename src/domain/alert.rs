//! Alert domain types
//!
//! Defines the evaluation context handed to evaluators, the candidate they
//! return, and the alert record produced from an unsuppressed candidate.

use super::fingerprint::Fingerprint;
use super::snapshot::{MeasurementPoint, Snapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Alert kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Primary value below its minimum
    Low,
    /// Primary value above its maximum
    High,
    /// Relative change against the previous snapshot too large
    RateOfChange,
    /// Secondary value below its minimum
    SecondaryLow,
    /// Secondary value above its maximum
    SecondaryHigh,
    /// Implied and observed values disagree
    Discrepancy,
}

impl AlertKind {
    /// Stable string tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::High => "high",
            Self::RateOfChange => "rate_of_change",
            Self::SecondaryLow => "secondary_low",
            Self::SecondaryHigh => "secondary_high",
            Self::Discrepancy => "discrepancy",
        }
    }

    /// Whether the kind reports a value falling below a bound
    pub fn is_falling(&self) -> bool {
        matches!(self, Self::Low | Self::SecondaryLow)
    }

    /// Whether the kind reports a value rising above a bound
    pub fn is_rising(&self) -> bool {
        matches!(self, Self::High | Self::SecondaryHigh)
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of the subject being evaluated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationContext {
    pub group_id: i64,
    pub group_name: String,
    pub subject_id: Option<i64>,
    pub display_name: Option<String>,
    pub display_code: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl EvaluationContext {
    /// Build the context for one record of a snapshot
    pub fn for_point(snapshot: &Snapshot, point: &MeasurementPoint) -> Self {
        Self {
            group_id: snapshot.group_id,
            group_name: snapshot.group_name.clone(),
            subject_id: point.subject_id,
            display_name: point.display_name.clone(),
            display_code: point.display_code.clone(),
            timestamp: snapshot.captured_at,
        }
    }

    /// `name (code)` label used in messages
    pub fn subject_label(&self) -> String {
        match (&self.display_name, &self.display_code) {
            (Some(name), Some(code)) => format!("{} ({})", name, code),
            (Some(name), None) => name.clone(),
            (None, Some(code)) => code.clone(),
            (None, None) => self
                .subject_id
                .map(|id| format!("subject {}", id))
                .unwrap_or_else(|| "group".to_string()),
        }
    }
}

/// Result of one evaluator run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertCandidate {
    pub should_trigger: bool,
    pub kind: AlertKind,
    pub message: String,
    pub threshold_value: Option<f64>,
    pub actual_value: Option<f64>,
    pub context: EvaluationContext,
}

impl AlertCandidate {
    /// Create a triggered candidate
    pub fn triggered(kind: AlertKind, message: String, context: &EvaluationContext) -> Self {
        Self {
            should_trigger: true,
            kind,
            message,
            threshold_value: None,
            actual_value: None,
            context: context.clone(),
        }
    }

    /// Attach threshold and actual values
    pub fn with_values(mut self, threshold: f64, actual: f64) -> Self {
        self.threshold_value = Some(threshold);
        self.actual_value = Some(actual);
        self
    }

    /// Suppression identity of this candidate
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::compute(
            self.kind,
            self.context.group_id,
            self.context.subject_id,
            self.threshold_value,
        )
    }
}

/// Identity of one stored alert.
///
/// A fingerprint refires once per window, so delivery state is tracked per
/// fingerprint and trigger time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertKey {
    pub fingerprint: Fingerprint,
    pub triggered_at: DateTime<Utc>,
}

/// A persisted, notifiable alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
    pub threshold_value: Option<f64>,
    pub actual_value: Option<f64>,
    pub group_id: i64,
    pub subject_id: Option<i64>,
    pub triggered_at: DateTime<Utc>,
    /// Set by the delivery side once notified
    pub sent: bool,
    pub fingerprint: Fingerprint,
}

impl Alert {
    /// Promote a candidate. Candidates that did not trigger never become alerts.
    pub fn from_candidate(candidate: &AlertCandidate) -> Option<Self> {
        if !candidate.should_trigger {
            return None;
        }

        Some(Self {
            kind: candidate.kind,
            message: candidate.message.clone(),
            threshold_value: candidate.threshold_value,
            actual_value: candidate.actual_value,
            group_id: candidate.context.group_id,
            subject_id: candidate.context.subject_id,
            triggered_at: candidate.context.timestamp,
            sent: false,
            fingerprint: candidate.fingerprint(),
        })
    }

    pub fn key(&self) -> AlertKey {
        AlertKey {
            fingerprint: self.fingerprint.clone(),
            triggered_at: self.triggered_at,
        }
    }
}

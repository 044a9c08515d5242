//! Alert evaluators
//!
//! Each evaluator inspects one subject record (and optionally the same
//! subject's record from the previous snapshot) and yields at most one
//! candidate. Evaluators hold only their parameters, so they can be shared
//! freely across threads.
//!
//! All bounds are exclusive: a value sitting exactly on a bound does not
//! trigger. Percentages are taken against the reference value (previous or
//! observed), never the current one.

use crate::domain::{AlertCandidate, AlertKind, EvaluationContext, MeasurementPoint};
use crate::error::{ConfigError, DataError};

/// The fixed set of evaluator variants
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluator {
    /// Primary min/max check
    Threshold(ThresholdEvaluator),
    /// Change against the previous snapshot
    RateOfChange(RateOfChangeEvaluator),
    /// Min/max check on a secondary value
    SecondaryThreshold(ThresholdEvaluator),
    /// Implied vs. observed value
    Discrepancy(DiscrepancyEvaluator),
}

impl Evaluator {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::Threshold(_) => "threshold",
            Self::RateOfChange(_) => "rate_of_change",
            Self::SecondaryThreshold(_) => "secondary",
            Self::Discrepancy(_) => "discrepancy",
        }
    }

    /// Run the evaluator.
    ///
    /// `Ok(None)` means "no opinion": the value is in range or a required
    /// field is absent. `Err` means a required field is present but malformed.
    pub fn evaluate(
        &self,
        current: &MeasurementPoint,
        previous: Option<&MeasurementPoint>,
        context: &EvaluationContext,
    ) -> Result<Option<AlertCandidate>, DataError> {
        match self {
            Self::Threshold(e) | Self::SecondaryThreshold(e) => e.evaluate(current, context),
            Self::RateOfChange(e) => e.evaluate(current, previous, context),
            Self::Discrepancy(e) => e.evaluate(current, context),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Primary,
    Secondary,
}

/// Two one-sided checks against `min` and `max`
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdEvaluator {
    field: String,
    min: f64,
    max: f64,
    scope: Scope,
}

impl ThresholdEvaluator {
    /// Threshold on the primary value
    pub fn primary(field: impl Into<String>, min: f64, max: f64) -> Result<Self, ConfigError> {
        Self::new(field.into(), min, max, Scope::Primary)
    }

    /// Threshold on a secondary value
    pub fn secondary(field: impl Into<String>, min: f64, max: f64) -> Result<Self, ConfigError> {
        Self::new(field.into(), min, max, Scope::Secondary)
    }

    fn new(field: String, min: f64, max: f64, scope: Scope) -> Result<Self, ConfigError> {
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(ConfigError::invalid(
                &field,
                format!("threshold needs finite min < max (got {} / {})", min, max),
            ));
        }
        Ok(Self {
            field,
            min,
            max,
            scope,
        })
    }

    fn evaluate(
        &self,
        current: &MeasurementPoint,
        context: &EvaluationContext,
    ) -> Result<Option<AlertCandidate>, DataError> {
        let Some(value) = current.number(&self.field)? else {
            return Ok(None);
        };

        let label = context.subject_label();
        let (kind, threshold, message) = if value < self.min {
            let message = match self.scope {
                Scope::Primary => format!(
                    "{} {} dropped to {:.1} at {}",
                    label, self.field, value, context.group_name
                ),
                Scope::Secondary => format!(
                    "{} {} dropped to ${:.2} at {}",
                    label, self.field, value, context.group_name
                ),
            };
            (self.low_kind(), self.min, message)
        } else if value > self.max {
            let message = match self.scope {
                Scope::Primary => format!(
                    "{} {} rose to {:.1} at {}",
                    label, self.field, value, context.group_name
                ),
                Scope::Secondary => format!(
                    "{} {} rose to ${:.2} at {}",
                    label, self.field, value, context.group_name
                ),
            };
            (self.high_kind(), self.max, message)
        } else {
            return Ok(None);
        };

        Ok(Some(
            AlertCandidate::triggered(kind, message, context).with_values(threshold, value),
        ))
    }

    fn low_kind(&self) -> AlertKind {
        match self.scope {
            Scope::Primary => AlertKind::Low,
            Scope::Secondary => AlertKind::SecondaryLow,
        }
    }

    fn high_kind(&self) -> AlertKind {
        match self.scope {
            Scope::Primary => AlertKind::High,
            Scope::Secondary => AlertKind::SecondaryHigh,
        }
    }
}

/// Relative change of one field between consecutive snapshots
#[derive(Debug, Clone, PartialEq)]
pub struct RateOfChangeEvaluator {
    field: String,
    percent: f64,
}

impl RateOfChangeEvaluator {
    pub fn new(field: impl Into<String>, percent: f64) -> Result<Self, ConfigError> {
        let field = field.into();
        if !percent.is_finite() || percent <= 0.0 {
            return Err(ConfigError::invalid(
                &field,
                format!("change percent must be positive, got {}", percent),
            ));
        }
        Ok(Self { field, percent })
    }

    fn evaluate(
        &self,
        current: &MeasurementPoint,
        previous: Option<&MeasurementPoint>,
        context: &EvaluationContext,
    ) -> Result<Option<AlertCandidate>, DataError> {
        let Some(previous) = previous else {
            return Ok(None);
        };
        let Some(now) = current.number(&self.field)? else {
            return Ok(None);
        };
        let Some(before) = previous.number(&self.field)? else {
            return Ok(None);
        };
        if before == 0.0 {
            return Ok(None);
        }

        let change = relative_change(now, before);
        if change <= self.percent {
            return Ok(None);
        }

        let direction = if now > before { "increased" } else { "decreased" };
        let message = format!(
            "{} {} {} by {:.1}% (from {:.1} to {:.1})",
            context.subject_label(),
            self.field,
            direction,
            change,
            before,
            now
        );

        Ok(Some(
            AlertCandidate::triggered(AlertKind::RateOfChange, message, context)
                .with_values(self.percent, change),
        ))
    }
}

/// Implied value from one source against the value observed in another.
///
/// Both values are read from the same pre-joined record; the acquisition
/// side is responsible for aligning them in time.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscrepancyEvaluator {
    observed_field: String,
    implied_field: String,
    percent: f64,
}

impl DiscrepancyEvaluator {
    pub fn new(
        observed_field: impl Into<String>,
        implied_field: impl Into<String>,
        percent: f64,
    ) -> Result<Self, ConfigError> {
        let observed_field = observed_field.into();
        if !percent.is_finite() || percent <= 0.0 {
            return Err(ConfigError::invalid(
                &observed_field,
                format!("discrepancy percent must be positive, got {}", percent),
            ));
        }
        Ok(Self {
            observed_field,
            implied_field: implied_field.into(),
            percent,
        })
    }

    fn evaluate(
        &self,
        current: &MeasurementPoint,
        context: &EvaluationContext,
    ) -> Result<Option<AlertCandidate>, DataError> {
        let Some(observed) = current.number(&self.observed_field)? else {
            return Ok(None);
        };
        let Some(implied) = current.number(&self.implied_field)? else {
            return Ok(None);
        };
        if observed == 0.0 {
            return Ok(None);
        }

        let difference = relative_change(implied, observed);
        if difference <= self.percent {
            return Ok(None);
        }

        let message = format!(
            "{} {} {:.2} differs from observed {} {:.2} by {:.1}% at {}",
            context.subject_label(),
            self.implied_field,
            implied,
            self.observed_field,
            observed,
            difference,
            context.group_name
        );

        Ok(Some(
            AlertCandidate::triggered(AlertKind::Discrepancy, message, context)
                .with_values(self.percent, difference),
        ))
    }
}

/// `|value - reference| / reference * 100`; never positive for a negative reference
fn relative_change(value: f64, reference: f64) -> f64 {
    (value - reference).abs() / reference * 100.0
}

//! Evaluator registry
//!
//! Builds the active evaluator set once from validated configuration and
//! runs it over subject records. Output follows declaration order:
//! threshold, rate of change, secondary, discrepancy.

use super::config::AlertConfig;
use super::evaluators::{DiscrepancyEvaluator, Evaluator, RateOfChangeEvaluator, ThresholdEvaluator};
use crate::domain::{AlertCandidate, EvaluationContext, MeasurementPoint};
use crate::error::{ConfigError, DataError};

/// Result of one evaluator that had an opinion
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Name of the evaluator that produced it
    pub evaluator: &'static str,
    pub result: Result<AlertCandidate, DataError>,
}

/// The enabled evaluators, in declaration order
#[derive(Debug, Clone, Default)]
pub struct EvaluatorRegistry {
    evaluators: Vec<Evaluator>,
}

impl EvaluatorRegistry {
    /// Create a registry from an explicit evaluator list
    pub fn new(evaluators: Vec<Evaluator>) -> Self {
        Self { evaluators }
    }

    /// Build the registry from configuration.
    ///
    /// Fails on the first invalid enabled evaluator. With the master switch
    /// off the registry is empty.
    pub fn from_config(config: &AlertConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut evaluators = Vec::new();
        if !config.enabled {
            log::info!("Alerting disabled; no evaluators registered");
            return Ok(Self { evaluators });
        }

        if config.threshold.enabled {
            evaluators.push(Evaluator::Threshold(ThresholdEvaluator::primary(
                config.threshold.field.clone(),
                config.threshold.min,
                config.threshold.max,
            )?));
        }
        if config.rate_of_change.enabled {
            evaluators.push(Evaluator::RateOfChange(RateOfChangeEvaluator::new(
                config.rate_of_change.field.clone(),
                config.rate_of_change.percent,
            )?));
        }
        if config.secondary.enabled {
            evaluators.push(Evaluator::SecondaryThreshold(ThresholdEvaluator::secondary(
                config.secondary.field.clone(),
                config.secondary.min,
                config.secondary.max,
            )?));
        }
        if config.discrepancy.enabled {
            evaluators.push(Evaluator::Discrepancy(DiscrepancyEvaluator::new(
                config.discrepancy.observed_field.clone(),
                config.discrepancy.implied_field.clone(),
                config.discrepancy.percent,
            )?));
        }

        log::debug!(
            "Registered evaluators: {}",
            evaluators
                .iter()
                .map(Evaluator::name)
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(Self { evaluators })
    }

    pub fn evaluators(&self) -> &[Evaluator] {
        &self.evaluators
    }

    pub fn len(&self) -> usize {
        self.evaluators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evaluators.is_empty()
    }

    /// Run every evaluator against one subject record.
    ///
    /// Evaluators with no opinion are dropped; errors are kept alongside the
    /// candidates so the caller can skip just that pairing.
    pub fn run(
        &self,
        current: &MeasurementPoint,
        previous: Option<&MeasurementPoint>,
        context: &EvaluationContext,
    ) -> Vec<Outcome> {
        self.evaluators
            .iter()
            .filter_map(|evaluator| {
                let result = match evaluator.evaluate(current, previous, context) {
                    Ok(Some(candidate)) => Ok(candidate),
                    Ok(None) => return None,
                    Err(e) => Err(e),
                };
                Some(Outcome {
                    evaluator: evaluator.name(),
                    result,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AlertKind;
    use chrono::Utc;

    fn context() -> EvaluationContext {
        EvaluationContext {
            group_id: 1,
            group_name: "Test Track".to_string(),
            subject_id: Some(1),
            display_name: Some("Thunder".to_string()),
            display_code: Some("1".to_string()),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_from_default_config() {
        let registry = EvaluatorRegistry::from_config(&AlertConfig::default()).unwrap();
        let names: Vec<_> = registry.evaluators().iter().map(Evaluator::name).collect();
        assert_eq!(names, vec!["threshold", "rate_of_change", "secondary"]);
    }

    #[test]
    fn test_all_enabled_in_declaration_order() {
        let mut config = AlertConfig::default();
        config.discrepancy.enabled = true;
        let registry = EvaluatorRegistry::from_config(&config).unwrap();
        let names: Vec<_> = registry.evaluators().iter().map(Evaluator::name).collect();
        assert_eq!(
            names,
            vec!["threshold", "rate_of_change", "secondary", "discrepancy"]
        );
    }

    #[test]
    fn test_master_switch_off() {
        let config = AlertConfig {
            enabled: false,
            ..AlertConfig::default()
        };
        let registry = EvaluatorRegistry::from_config(&config).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_invalid_config_refused() {
        let mut config = AlertConfig::default();
        config.threshold.min = 30.0;
        assert!(EvaluatorRegistry::from_config(&config).is_err());
    }

    #[test]
    fn test_run_collects_in_order() {
        let mut config = AlertConfig::default();
        config.threshold.min = 2.0;
        let registry = EvaluatorRegistry::from_config(&config).unwrap();

        let current = MeasurementPoint::new(Some(1))
            .with_field("win_odds", 1.0)
            .with_field("payout", 2500.0);
        let previous = MeasurementPoint::new(Some(1)).with_field("win_odds", 4.0);

        let outcomes = registry.run(&current, Some(&previous), &context());
        let kinds: Vec<_> = outcomes
            .iter()
            .map(|o| o.result.as_ref().unwrap().kind)
            .collect();
        assert_eq!(
            kinds,
            vec![AlertKind::Low, AlertKind::RateOfChange, AlertKind::SecondaryHigh]
        );
    }

    #[test]
    fn test_run_missing_fields_yields_nothing() {
        let registry = EvaluatorRegistry::from_config(&AlertConfig::default()).unwrap();
        let current = MeasurementPoint::new(Some(1)).with_field("unrelated", 1.0);
        assert!(registry.run(&current, None, &context()).is_empty());
    }

    #[test]
    fn test_run_keeps_errors_separate() {
        let registry = EvaluatorRegistry::from_config(&AlertConfig::default()).unwrap();
        let current = MeasurementPoint::new(Some(1))
            .with_field("win_odds", "???")
            .with_field("payout", 5.0);

        let outcomes = registry.run(&current, None, &context());
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].evaluator, "threshold");
        assert!(outcomes[0].result.is_err());
        assert_eq!(outcomes[1].evaluator, "secondary");
        assert!(outcomes[1].result.is_ok());
    }
}

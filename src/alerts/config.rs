//! Alert configuration
//!
//! Per-evaluator enable flags and parameters plus suppression settings.
//! Lives under the `[alerts]` table of the main TOML file.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Alert section of the configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Master switch; when off no evaluator is built
    pub enabled: bool,
    /// Primary min/max check
    pub threshold: ThresholdConfig,
    /// Change against the previous snapshot
    pub rate_of_change: RateOfChangeConfig,
    /// Min/max check on a secondary value
    pub secondary: SecondaryConfig,
    /// Implied vs. observed comparison
    pub discrepancy: DiscrepancyConfig,
    /// Duplicate suppression
    pub suppression: SuppressionConfig,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: ThresholdConfig::default(),
            rate_of_change: RateOfChangeConfig::default(),
            secondary: SecondaryConfig::default(),
            discrepancy: DiscrepancyConfig::default(),
            suppression: SuppressionConfig::default(),
        }
    }
}

impl AlertConfig {
    /// Validate every enabled evaluator and the suppression settings.
    ///
    /// Disabled evaluators are not checked.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threshold.enabled {
            validate_bounds(
                "alerts.threshold",
                &self.threshold.field,
                self.threshold.min,
                self.threshold.max,
            )?;
        }
        if self.rate_of_change.enabled {
            validate_field("alerts.rate_of_change.field", &self.rate_of_change.field)?;
            validate_percent("alerts.rate_of_change.percent", self.rate_of_change.percent)?;
        }
        if self.secondary.enabled {
            validate_bounds(
                "alerts.secondary",
                &self.secondary.field,
                self.secondary.min,
                self.secondary.max,
            )?;
        }
        if self.discrepancy.enabled {
            validate_field(
                "alerts.discrepancy.observed_field",
                &self.discrepancy.observed_field,
            )?;
            validate_field(
                "alerts.discrepancy.implied_field",
                &self.discrepancy.implied_field,
            )?;
            if self.discrepancy.observed_field == self.discrepancy.implied_field {
                return Err(ConfigError::invalid(
                    "alerts.discrepancy.implied_field",
                    "must differ from observed_field",
                ));
            }
            validate_percent("alerts.discrepancy.percent", self.discrepancy.percent)?;
        }
        if self.suppression.window_secs == 0 {
            return Err(ConfigError::invalid(
                "alerts.suppression.window_secs",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Primary threshold settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub enabled: bool,
    /// Field to read from each subject record
    pub field: String,
    /// Alert when the value is strictly below this
    pub min: f64,
    /// Alert when the value is strictly above this
    pub max: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            field: "win_odds".to_string(),
            min: 1.5,
            max: 20.0,
        }
    }
}

/// Secondary threshold settings (e.g. exacta payouts)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecondaryConfig {
    pub enabled: bool,
    pub field: String,
    pub min: f64,
    pub max: f64,
}

impl Default for SecondaryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            field: "payout".to_string(),
            min: 10.0,
            max: 1000.0,
        }
    }
}

/// Rate-of-change settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateOfChangeConfig {
    pub enabled: bool,
    pub field: String,
    /// Alert when the change strictly exceeds this percentage
    pub percent: f64,
}

impl Default for RateOfChangeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            field: "win_odds".to_string(),
            percent: 25.0,
        }
    }
}

/// Cross-source discrepancy settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscrepancyConfig {
    pub enabled: bool,
    /// Directly observed value; the comparison reference
    pub observed_field: String,
    /// Value implied by the other source
    pub implied_field: String,
    /// Alert when the relative difference strictly exceeds this percentage
    pub percent: f64,
}

impl Default for DiscrepancyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            observed_field: "win_odds".to_string(),
            implied_field: "implied_odds".to_string(),
            percent: 30.0,
        }
    }
}

/// Suppression settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuppressionConfig {
    /// Trailing window during which a duplicate fingerprint is withheld
    pub window_secs: u64,
    /// Cap on alerts produced per group in one evaluation; 0 disables the cap
    pub max_alerts_per_group: usize,
}

impl Default for SuppressionConfig {
    fn default() -> Self {
        Self {
            window_secs: 300,
            max_alerts_per_group: 10,
        }
    }
}

impl SuppressionConfig {
    /// Window as a duration
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

fn validate_field(key: &str, field: &str) -> Result<(), ConfigError> {
    if field.trim().is_empty() {
        return Err(ConfigError::MissingField(key.to_string()));
    }
    Ok(())
}

fn validate_bounds(prefix: &str, field: &str, min: f64, max: f64) -> Result<(), ConfigError> {
    validate_field(&format!("{}.field", prefix), field)?;
    if !min.is_finite() || !max.is_finite() {
        return Err(ConfigError::invalid(
            prefix,
            format!("bounds must be finite (min {}, max {})", min, max),
        ));
    }
    if min >= max {
        return Err(ConfigError::invalid(
            &format!("{}.min", prefix),
            format!("min ({}) must be less than max ({})", min, max),
        ));
    }
    Ok(())
}

fn validate_percent(key: &str, percent: f64) -> Result<(), ConfigError> {
    if !percent.is_finite() || percent <= 0.0 {
        return Err(ConfigError::invalid(
            key,
            format!("must be a positive percentage, got {}", percent),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AlertConfig::default();
        assert!(config.enabled);
        assert_eq!(config.threshold.min, 1.5);
        assert_eq!(config.threshold.max, 20.0);
        assert_eq!(config.secondary.field, "payout");
        assert!(!config.discrepancy.enabled);
        assert_eq!(config.suppression.window(), Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_min_not_below_max_rejected() {
        let mut config = AlertConfig::default();
        config.threshold.min = 20.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("alerts.threshold.min"));
    }

    #[test]
    fn test_disabled_evaluator_not_validated() {
        let mut config = AlertConfig::default();
        config.secondary.enabled = false;
        config.secondary.min = 5000.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_non_positive_percent_rejected() {
        let mut config = AlertConfig::default();
        config.rate_of_change.percent = 0.0;
        assert!(config.validate().is_err());

        config.rate_of_change.percent = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_discrepancy_fields_must_differ() {
        let mut config = AlertConfig::default();
        config.discrepancy.enabled = true;
        config.discrepancy.implied_field = "win_odds".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_field_rejected() {
        let mut config = AlertConfig::default();
        config.threshold.field = " ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField(_))
        ));
    }

    #[test]
    fn test_zero_window_rejected() {
        let mut config = AlertConfig::default();
        config.suppression.window_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AlertConfig = toml::from_str(
            r#"
            [threshold]
            min = 2.0

            [secondary]
            max = 500.0
            "#,
        )
        .unwrap();

        assert_eq!(config.threshold.min, 2.0);
        assert_eq!(config.threshold.max, 20.0);
        assert_eq!(config.secondary.field, "payout");
        assert_eq!(config.secondary.max, 500.0);
    }
}

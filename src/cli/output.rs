//! Output formatting utilities
//!
//! Provides table and JSON output formatting for CLI commands.

use crate::cli::args::OutputFormat;
use crate::config::Config;
use crate::domain::{Alert, Snapshot};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::{self, Write};

/// Format and print output based on the selected format
pub fn print_output<T: Serialize + TableDisplay>(data: &T, format: OutputFormat) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match format {
        OutputFormat::Table => {
            writeln!(handle, "{}", data.to_table())?;
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string());
            writeln!(handle, "{}", json)?;
        }
        OutputFormat::Compact => {
            writeln!(handle, "{}", data.to_compact())?;
        }
    }

    Ok(())
}

/// Trait for types that can be displayed as a table
pub trait TableDisplay {
    /// Format as a table string
    fn to_table(&self) -> String;

    /// Format as a compact single line
    fn to_compact(&self) -> String {
        self.to_table().replace('\n', " | ")
    }
}

/// One alert row
#[derive(Debug, Clone, Serialize)]
pub struct AlertEntry {
    pub kind: String,
    pub subject_id: Option<i64>,
    pub threshold: Option<f64>,
    pub actual: Option<f64>,
    pub message: String,
    pub fingerprint: String,
}

impl From<&Alert> for AlertEntry {
    fn from(alert: &Alert) -> Self {
        Self {
            kind: alert.kind.to_string(),
            subject_id: alert.subject_id,
            threshold: alert.threshold_value,
            actual: alert.actual_value,
            message: alert.message.clone(),
            fingerprint: alert.fingerprint.to_string(),
        }
    }
}

fn number_cell(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string())
}

/// Alerts produced for one snapshot
#[derive(Debug, Clone, Serialize)]
pub struct AlertList {
    pub group_id: i64,
    pub group_name: String,
    pub captured_at: DateTime<Utc>,
    pub subjects: usize,
    pub alerts: Vec<AlertEntry>,
}

impl AlertList {
    pub fn new(snapshot: &Snapshot, alerts: &[Alert]) -> Self {
        Self {
            group_id: snapshot.group_id,
            group_name: snapshot.group_name.clone(),
            captured_at: snapshot.captured_at,
            subjects: snapshot.subjects.len(),
            alerts: alerts.iter().map(AlertEntry::from).collect(),
        }
    }
}

impl TableDisplay for AlertList {
    fn to_table(&self) -> String {
        let mut output = format!(
            "{} (group {}) at {}\n",
            self.group_name,
            self.group_id,
            self.captured_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        output.push_str(&format!(
            "  Subjects: {}  Alerts: {}\n",
            self.subjects,
            self.alerts.len()
        ));

        if self.alerts.is_empty() {
            output.push_str("  No alerts\n");
            return output;
        }

        output.push('\n');
        output.push_str("  KIND            SUBJECT  THRESHOLD   ACTUAL      MESSAGE\n");
        output.push_str("  ────────────────────────────────────────────────────────────\n");

        for alert in &self.alerts {
            output.push_str(&format!(
                "  {:<15} {:<8} {:<11} {:<11} {}\n",
                alert.kind,
                alert
                    .subject_id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                number_cell(alert.threshold),
                number_cell(alert.actual),
                alert.message
            ));
        }

        output
    }

    fn to_compact(&self) -> String {
        if self.alerts.is_empty() {
            format!("{}: no alerts", self.group_name)
        } else {
            let kinds: Vec<_> = self.alerts.iter().map(|a| a.kind.as_str()).collect();
            format!(
                "{}: {} alert(s) [{}]",
                self.group_name,
                self.alerts.len(),
                kinds.join(", ")
            )
        }
    }
}

/// Result of a replay run
#[derive(Debug, Clone, Serialize)]
pub struct ReplaySummary {
    pub snapshots: usize,
    pub total_alerts: usize,
    pub evaluations: Vec<AlertList>,
}

impl TableDisplay for ReplaySummary {
    fn to_table(&self) -> String {
        let mut output = String::new();
        for evaluation in &self.evaluations {
            output.push_str(&evaluation.to_table());
            output.push('\n');
        }
        output.push_str(&format!(
            "Replayed {} snapshot(s), {} alert(s)",
            self.snapshots, self.total_alerts
        ));
        output
    }

    fn to_compact(&self) -> String {
        format!("{} snapshots, {} alerts", self.snapshots, self.total_alerts)
    }
}

/// Effective configuration
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    pub source: Option<String>,
    pub config: Config,
}

impl TableDisplay for ConfigSummary {
    fn to_table(&self) -> String {
        let mut output = format!(
            "# Source: {}\n",
            self.source.as_deref().unwrap_or("built-in defaults")
        );
        match toml::to_string_pretty(&self.config) {
            Ok(body) => output.push_str(&body),
            Err(e) => output.push_str(&format!("# cannot render configuration: {}\n", e)),
        }
        output
    }

    fn to_compact(&self) -> String {
        let alerts = &self.config.alerts;
        let enabled: Vec<&str> = [
            ("threshold", alerts.threshold.enabled),
            ("rate_of_change", alerts.rate_of_change.enabled),
            ("secondary", alerts.secondary.enabled),
            ("discrepancy", alerts.discrepancy.enabled),
        ]
        .into_iter()
        .filter(|(_, on)| alerts.enabled && *on)
        .map(|(name, _)| name)
        .collect();

        format!(
            "evaluators=[{}] window={}s",
            enabled.join(","),
            alerts.suppression.window_secs
        )
    }
}

/// Simple message output
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub message: String,
    pub success: bool,
}

impl TableDisplay for Message {
    fn to_table(&self) -> String {
        if self.success {
            format!("✓ {}", self.message)
        } else {
            format!("✗ {}", self.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AlertCandidate, AlertKind, EvaluationContext};

    fn sample() -> (Snapshot, Vec<Alert>) {
        let snapshot = Snapshot::new(3, "Test Track", Utc::now());
        let context = EvaluationContext {
            group_id: 3,
            group_name: "Test Track".to_string(),
            subject_id: Some(5),
            display_name: None,
            display_code: None,
            timestamp: snapshot.captured_at,
        };
        let candidate =
            AlertCandidate::triggered(AlertKind::High, "odds 25.0".to_string(), &context)
                .with_values(20.0, 25.0);
        (snapshot, vec![Alert::from_candidate(&candidate).unwrap()])
    }

    #[test]
    fn test_alert_list_table() {
        let (snapshot, alerts) = sample();
        let output = AlertList::new(&snapshot, &alerts).to_table();
        assert!(output.contains("Test Track (group 3)"));
        assert!(output.contains("high"));
        assert!(output.contains("20.00"));
        assert!(output.contains("odds 25.0"));
    }

    #[test]
    fn test_alert_list_compact() {
        let (snapshot, alerts) = sample();
        assert_eq!(
            AlertList::new(&snapshot, &alerts).to_compact(),
            "Test Track: 1 alert(s) [high]"
        );
        assert_eq!(
            AlertList::new(&snapshot, &[]).to_compact(),
            "Test Track: no alerts"
        );
    }

    #[test]
    fn test_config_summary_compact() {
        let summary = ConfigSummary {
            source: None,
            config: Config::default(),
        };
        assert_eq!(
            summary.to_compact(),
            "evaluators=[threshold,rate_of_change,secondary] window=300s"
        );
        assert!(summary.to_table().starts_with("# Source: built-in defaults"));
    }

    #[test]
    fn test_message_display() {
        let msg = Message {
            message: "Configuration is valid".to_string(),
            success: true,
        };

        assert!(msg.to_table().starts_with('✓'));
    }
}

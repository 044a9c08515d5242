//! Alert notification
//!
//! Delivery channels for alerts that survived suppression. Only terminal
//! output ships here; other channels plug in through [`Notifier`].

use crate::domain::{Alert, AlertKind};
use crate::error::Result;
use std::io::{self, Write};

/// Notification channel trait
pub trait Notifier: Send + Sync {
    /// Send a notification for an alert
    fn notify(&self, alert: &Alert) -> Result<()>;

    /// Channel name for identification
    fn name(&self) -> &str;
}

/// Terminal/console notifier
///
/// Outputs alerts to stdout/stderr, colouring the kind by direction
pub struct TerminalNotifier {
    use_stderr: bool,
    use_colors: bool,
}

impl TerminalNotifier {
    /// Create a new terminal notifier writing to stderr
    pub fn new() -> Self {
        Self {
            use_stderr: true,
            use_colors: Self::supports_color(),
        }
    }

    /// Create a notifier that uses stdout
    pub fn stdout() -> Self {
        Self {
            use_stderr: false,
            use_colors: Self::supports_color(),
        }
    }

    /// Create a notifier without colors
    pub fn no_color() -> Self {
        Self {
            use_stderr: true,
            use_colors: false,
        }
    }

    fn supports_color() -> bool {
        std::env::var("TERM")
            .map(|term| term != "dumb")
            .unwrap_or(false)
            && std::env::var_os("NO_COLOR").is_none()
    }

    fn format_alert(&self, alert: &Alert) -> String {
        format!(
            "[{}] {} group {}: {}",
            alert.triggered_at.format("%H:%M:%S"),
            self.format_kind(alert.kind),
            alert.group_id,
            alert.message
        )
    }

    fn format_kind(&self, kind: AlertKind) -> String {
        let text = kind.as_str().to_ascii_uppercase();
        if !self.use_colors {
            return text;
        }

        let color_code = if kind.is_falling() {
            "\x1b[36m" // Cyan
        } else if kind.is_rising() {
            "\x1b[31m" // Red
        } else {
            "\x1b[33m" // Yellow
        };

        format!("{}{}\x1b[0m", color_code, text)
    }
}

impl Default for TerminalNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, alert: &Alert) -> Result<()> {
        let message = self.format_alert(alert);

        if self.use_stderr {
            let mut handle = io::stderr().lock();
            writeln!(handle, "{}", message)?;
        } else {
            let mut handle = io::stdout().lock();
            writeln!(handle, "{}", message)?;
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "terminal"
    }
}

/// Fans alerts out to every registered channel
pub struct NotificationManager {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotificationManager {
    /// Create a manager with no channels
    pub fn new() -> Self {
        Self {
            notifiers: Vec::new(),
        }
    }

    pub fn add_notifier(&mut self, notifier: Box<dyn Notifier>) {
        self.notifiers.push(notifier);
    }

    /// Send to all channels; true when at least one channel delivered.
    ///
    /// A failing channel is logged and does not stop the others.
    pub fn notify_all(&self, alert: &Alert) -> bool {
        let mut delivered = false;
        for notifier in &self.notifiers {
            match notifier.notify(alert) {
                Ok(()) => delivered = true,
                Err(e) => log::warn!(
                    "Failed to notify via {} for {} alert {}: {}",
                    notifier.name(),
                    alert.kind,
                    alert.fingerprint.short(),
                    e
                ),
            }
        }
        delivered
    }

    /// Send a batch; returns the alerts that reached at least one channel
    pub fn notify_batch<'a>(&self, alerts: &'a [Alert]) -> Vec<&'a Alert> {
        alerts.iter().filter(|a| self.notify_all(a)).collect()
    }

    pub fn notifier_count(&self) -> usize {
        self.notifiers.len()
    }
}

impl Default for NotificationManager {
    fn default() -> Self {
        let mut manager = Self::new();
        manager.add_notifier(Box::new(TerminalNotifier::new()));
        manager
    }
}

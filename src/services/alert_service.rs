//! Alert service
//!
//! Runs the engine over a snapshot, notifies the surviving alerts and marks
//! the delivered ones as sent in the alert store.

use crate::alerts::{AlertEngine, AlertStore, NotificationManager};
use crate::domain::{Alert, AlertKey, Snapshot};
use crate::error::{EngineError, Result};
use std::sync::Arc;

/// Evaluate-then-notify pipeline
pub struct AlertService {
    engine: AlertEngine,
    notifier: NotificationManager,
    store: Arc<dyn AlertStore>,
}

impl AlertService {
    /// `store` must be the same alert store the engine persists into
    pub fn new(engine: AlertEngine, notifier: NotificationManager, store: Arc<dyn AlertStore>) -> Self {
        Self {
            engine,
            notifier,
            store,
        }
    }

    pub fn engine(&self) -> &AlertEngine {
        &self.engine
    }

    /// Evaluate a snapshot and deliver its alerts.
    ///
    /// Alerts are delivered even when persisting them failed; the persist
    /// error is still returned afterwards.
    pub fn process(&self, snapshot: &Snapshot) -> Result<Vec<Alert>> {
        match self.engine.evaluate(snapshot) {
            Ok(mut alerts) => {
                let delivered = self.deliver(&mut alerts);
                if !delivered.is_empty() {
                    if let Err(e) = self.store.mark_sent(&delivered) {
                        log::warn!("Failed to mark {} alert(s) as sent: {}", delivered.len(), e);
                    }
                }
                Ok(alerts)
            }
            Err(EngineError::Persist { mut alerts, source }) => {
                self.deliver(&mut alerts);
                Err(EngineError::Persist { alerts, source }.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Deliver alerts left unsent in the store; returns how many went out
    pub fn flush_unsent(&self) -> Result<usize> {
        let pending = self.store.unsent()?;
        if pending.is_empty() {
            return Ok(0);
        }

        let delivered: Vec<AlertKey> = self
            .notifier
            .notify_batch(&pending)
            .into_iter()
            .map(Alert::key)
            .collect();

        if !delivered.is_empty() {
            self.store.mark_sent(&delivered)?;
        }
        log::info!("Flushed {} of {} unsent alert(s)", delivered.len(), pending.len());
        Ok(delivered.len())
    }

    fn deliver(&self, alerts: &mut [Alert]) -> Vec<AlertKey> {
        let mut delivered = Vec::new();
        for alert in alerts.iter_mut() {
            if self.notifier.notify_all(alert) {
                alert.sent = true;
                delivered.push(alert.key());
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::{AlertConfig, Clock, ManualClock, MemoryStore, Notifier};
    use crate::error::AppError;
    use crate::mock::{odds_point, FailingStore};
    use chrono::Utc;
    use std::io;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Capture {
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl Notifier for Capture {
        fn notify(&self, alert: &Alert) -> Result<()> {
            self.seen.lock().unwrap().push(alert.message.clone());
            Ok(())
        }

        fn name(&self) -> &str {
            "capture"
        }
    }

    /// Channel that can be taken offline
    #[derive(Default)]
    struct Pager {
        down: Arc<AtomicBool>,
    }

    impl Notifier for Pager {
        fn notify(&self, _alert: &Alert) -> Result<()> {
            if self.down.load(Ordering::SeqCst) {
                return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "pager offline").into());
            }
            Ok(())
        }

        fn name(&self) -> &str {
            "pager"
        }
    }

    fn service_with(store: Arc<MemoryStore>) -> (AlertService, Arc<Mutex<Vec<String>>>) {
        let capture = Capture::default();
        let seen = capture.seen.clone();
        let mut notifier = NotificationManager::new();
        notifier.add_notifier(Box::new(capture));

        let clock = Arc::new(ManualClock::new(Utc::now()));
        let engine =
            AlertEngine::new(&AlertConfig::default(), store.clone(), store.clone(), clock).unwrap();
        (AlertService::new(engine, notifier, store), seen)
    }

    #[test]
    fn test_process_delivers_and_marks_sent() {
        let store = Arc::new(MemoryStore::new());
        let (service, seen) = service_with(store.clone());

        let snapshot =
            Snapshot::new(1, "Test Track", Utc::now()).with_subject(odds_point(1, "Thunder", 1.2));
        let alerts = service.process(&snapshot).unwrap();

        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].sent);
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert!(store.unsent().unwrap().is_empty());
    }

    #[test]
    fn test_flush_unsent() {
        let store = Arc::new(MemoryStore::new());
        let (service, seen) = service_with(store.clone());

        let snapshot =
            Snapshot::new(1, "Test Track", Utc::now()).with_subject(odds_point(1, "Thunder", 30.0));
        let alert = service.engine().evaluate(&snapshot).unwrap().remove(0);
        assert!(!alert.sent);

        assert_eq!(service.flush_unsent().unwrap(), 1);
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(service.flush_unsent().unwrap(), 0);
    }

    #[test]
    fn test_process_delivers_despite_persist_failure() {
        let store = Arc::new(FailingStore::new());
        let capture = Capture::default();
        let seen = capture.seen.clone();
        let mut notifier = NotificationManager::new();
        notifier.add_notifier(Box::new(capture));

        let clock = Arc::new(ManualClock::new(Utc::now()));
        let engine =
            AlertEngine::new(&AlertConfig::default(), store.clone(), store.clone(), clock).unwrap();
        let service = AlertService::new(engine, notifier, store);

        let snapshot =
            Snapshot::new(1, "Test Track", Utc::now()).with_subject(odds_point(1, "Thunder", 1.2));
        match service.process(&snapshot) {
            Err(AppError::Engine(EngineError::Persist { alerts, .. })) => {
                assert_eq!(alerts.len(), 1);
                assert!(alerts[0].sent);
            }
            other => panic!("expected persist error, got {:?}", other),
        }
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_refire_delivery_keeps_earlier_failed_alert_pending() {
        let store = Arc::new(MemoryStore::new());
        let t0 = Utc::now();
        let clock = Arc::new(ManualClock::new(t0));
        let engine = AlertEngine::new(
            &AlertConfig::default(),
            store.clone(),
            store.clone(),
            clock.clone(),
        )
        .unwrap();
        let pager = Pager::default();
        let down = pager.down.clone();
        let mut notifier = NotificationManager::new();
        notifier.add_notifier(Box::new(pager));
        let service = AlertService::new(engine, notifier, store.clone());

        down.store(true, Ordering::SeqCst);
        let first = service
            .process(&Snapshot::new(1, "Test Track", t0).with_subject(odds_point(1, "Thunder", 1.2)))
            .unwrap();
        assert_eq!(first.len(), 1);
        assert!(!first[0].sent);

        // same fingerprint fires again in the next window and goes out
        down.store(false, Ordering::SeqCst);
        clock.advance(Duration::from_secs(301));
        let second = service
            .process(
                &Snapshot::new(1, "Test Track", clock.now())
                    .with_subject(odds_point(1, "Thunder", 1.1)),
            )
            .unwrap();
        assert_eq!(second.len(), 1);
        assert!(second[0].sent);
        assert_eq!(first[0].fingerprint, second[0].fingerprint);

        let unsent = store.unsent().unwrap();
        assert_eq!(unsent.len(), 1);
        assert_eq!(unsent[0].triggered_at, t0);

        assert_eq!(service.flush_unsent().unwrap(), 1);
        assert!(store.unsent().unwrap().is_empty());
    }
}

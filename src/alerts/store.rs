//! External store boundary
//!
//! The engine reads the previous snapshot of a group and writes produced
//! alerts through these traits. Real deployments back them with a database;
//! [`MemoryStore`] backs the CLI and tests. [`TimeoutStore`] bounds every
//! call so a stalled backend degrades to a recoverable [`StoreError`].

use crate::domain::{Alert, AlertKey, AlertKind, Snapshot};
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

/// Snapshot history lookup
pub trait SnapshotSource: Send + Sync {
    /// The most recent snapshot of `group_id` captured strictly before `before`
    fn previous(&self, group_id: i64, before: DateTime<Utc>)
        -> Result<Option<Snapshot>, StoreError>;
}

/// Durable alert log
pub trait AlertStore: Send + Sync {
    /// Persist a batch, preserving order
    fn save(&self, alerts: &[Alert]) -> Result<(), StoreError>;

    /// Count alerts of `kind` for the same group and subject (or the same
    /// group-wide slot when `subject_id` is `None`) triggered after `since`
    fn count_recent(
        &self,
        kind: AlertKind,
        group_id: i64,
        subject_id: Option<i64>,
        since: DateTime<Utc>,
    ) -> Result<usize, StoreError>;

    /// Alerts not yet delivered, oldest first
    fn unsent(&self) -> Result<Vec<Alert>, StoreError>;

    /// Flag the alerts with these keys as sent
    fn mark_sent(&self, keys: &[AlertKey]) -> Result<(), StoreError>;
}

/// In-process snapshot history and alert log
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshots: Mutex<Vec<Snapshot>>,
    alerts: Mutex<Vec<Alert>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a snapshot to the history
    pub fn record_snapshot(&self, snapshot: Snapshot) {
        lock(&self.snapshots).push(snapshot);
    }

    /// Copy of the alert log
    pub fn alerts(&self) -> Vec<Alert> {
        lock(&self.alerts).clone()
    }
}

impl SnapshotSource for MemoryStore {
    fn previous(
        &self,
        group_id: i64,
        before: DateTime<Utc>,
    ) -> Result<Option<Snapshot>, StoreError> {
        Ok(lock(&self.snapshots)
            .iter()
            .filter(|s| s.group_id == group_id && s.captured_at < before)
            .max_by_key(|s| s.captured_at)
            .cloned())
    }
}

impl AlertStore for MemoryStore {
    fn save(&self, alerts: &[Alert]) -> Result<(), StoreError> {
        lock(&self.alerts).extend_from_slice(alerts);
        Ok(())
    }

    fn count_recent(
        &self,
        kind: AlertKind,
        group_id: i64,
        subject_id: Option<i64>,
        since: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        Ok(lock(&self.alerts)
            .iter()
            .filter(|a| {
                a.kind == kind
                    && a.group_id == group_id
                    && a.subject_id == subject_id
                    && a.triggered_at > since
            })
            .count())
    }

    fn unsent(&self) -> Result<Vec<Alert>, StoreError> {
        Ok(lock(&self.alerts)
            .iter()
            .filter(|a| !a.sent)
            .cloned()
            .collect())
    }

    fn mark_sent(&self, keys: &[AlertKey]) -> Result<(), StoreError> {
        for alert in lock(&self.alerts).iter_mut().filter(|a| !a.sent) {
            if keys
                .iter()
                .any(|k| k.fingerprint == alert.fingerprint && k.triggered_at == alert.triggered_at)
            {
                alert.sent = true;
            }
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Bounds every call on the wrapped store.
///
/// Each call runs on a short-lived worker thread; when the bound passes the
/// caller gets [`StoreError::Timeout`] while the worker finishes in the
/// background. A timed-out `save` may therefore still land.
pub struct TimeoutStore<S> {
    inner: Arc<S>,
    timeout: Duration,
}

impl<S: Send + Sync + 'static> TimeoutStore<S> {
    pub fn new(inner: Arc<S>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    fn call<T, F>(&self, op: &'static str, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&S) -> Result<T, StoreError> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let (tx, rx) = mpsc::channel();

        thread::Builder::new()
            .name(format!("store-{}", op))
            .spawn(move || {
                // receiver may be gone after a timeout
                let _ = tx.send(f(&inner));
            })
            .map_err(|e| StoreError::Unavailable(format!("cannot start {} call: {}", op, e)))?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                log::warn!("Store {} call exceeded {:?}", op, self.timeout);
                Err(StoreError::Timeout(self.timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(StoreError::Unavailable(format!(
                "{} call ended without a result",
                op
            ))),
        }
    }
}

impl<S: SnapshotSource + 'static> SnapshotSource for TimeoutStore<S> {
    fn previous(
        &self,
        group_id: i64,
        before: DateTime<Utc>,
    ) -> Result<Option<Snapshot>, StoreError> {
        self.call("previous", move |s| s.previous(group_id, before))
    }
}

impl<S: AlertStore + 'static> AlertStore for TimeoutStore<S> {
    fn save(&self, alerts: &[Alert]) -> Result<(), StoreError> {
        let alerts = alerts.to_vec();
        self.call("save", move |s| s.save(&alerts))
    }

    fn count_recent(
        &self,
        kind: AlertKind,
        group_id: i64,
        subject_id: Option<i64>,
        since: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        self.call("count_recent", move |s| {
            s.count_recent(kind, group_id, subject_id, since)
        })
    }

    fn unsent(&self) -> Result<Vec<Alert>, StoreError> {
        self.call("unsent", |s| s.unsent())
    }

    fn mark_sent(&self, keys: &[AlertKey]) -> Result<(), StoreError> {
        let keys = keys.to_vec();
        self.call("mark_sent", move |s| s.mark_sent(&keys))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AlertCandidate, EvaluationContext, MeasurementPoint};
    use crate::mock::SlowStore;

    fn alert(kind: AlertKind, subject_id: Option<i64>, at: DateTime<Utc>) -> Alert {
        let snapshot = Snapshot::new(1, "Test Track", at);
        let context = EvaluationContext::for_point(&snapshot, &MeasurementPoint::new(subject_id));
        let candidate =
            AlertCandidate::triggered(kind, "test".to_string(), &context).with_values(2.0, 1.5);
        Alert::from_candidate(&candidate).unwrap()
    }

    #[test]
    fn test_previous_returns_immediately_preceding() {
        let store = MemoryStore::new();
        let t0 = Utc::now();
        for offset in [0, 60, 120] {
            store.record_snapshot(Snapshot::new(1, "A", t0 + chrono::Duration::seconds(offset)));
        }
        store.record_snapshot(Snapshot::new(2, "B", t0 + chrono::Duration::seconds(90)));

        let previous = store
            .previous(1, t0 + chrono::Duration::seconds(100))
            .unwrap()
            .unwrap();
        assert_eq!(previous.captured_at, t0 + chrono::Duration::seconds(60));

        assert!(store.previous(1, t0).unwrap().is_none());
        assert!(store.previous(3, t0 + chrono::Duration::days(1)).unwrap().is_none());
    }

    #[test]
    fn test_count_recent_matches_kind_group_subject() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store
            .save(&[
                alert(AlertKind::Low, Some(2), now),
                alert(AlertKind::Low, None, now),
                alert(AlertKind::High, Some(2), now),
            ])
            .unwrap();

        let since = now - chrono::Duration::seconds(300);
        assert_eq!(store.count_recent(AlertKind::Low, 1, Some(2), since).unwrap(), 1);
        assert_eq!(store.count_recent(AlertKind::Low, 1, None, since).unwrap(), 1);
        assert_eq!(store.count_recent(AlertKind::Low, 1, Some(3), since).unwrap(), 0);
        assert_eq!(store.count_recent(AlertKind::Low, 9, Some(2), since).unwrap(), 0);
        assert_eq!(store.count_recent(AlertKind::Low, 1, Some(2), now).unwrap(), 0);
    }

    #[test]
    fn test_unsent_and_mark_sent() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let first = alert(AlertKind::Low, Some(1), now);
        let second = alert(AlertKind::High, Some(1), now);
        store.save(&[first.clone(), second]).unwrap();

        assert_eq!(store.unsent().unwrap().len(), 2);
        store.mark_sent(&[first.key()]).unwrap();

        let unsent = store.unsent().unwrap();
        assert_eq!(unsent.len(), 1);
        assert_eq!(unsent[0].kind, AlertKind::High);
    }

    #[test]
    fn test_mark_sent_leaves_earlier_firing_unsent() {
        let store = MemoryStore::new();
        let t0 = Utc::now();
        let earlier = alert(AlertKind::Low, Some(1), t0);
        let later = alert(AlertKind::Low, Some(1), t0 + chrono::Duration::seconds(301));
        assert_eq!(earlier.fingerprint, later.fingerprint);
        store.save(&[earlier, later.clone()]).unwrap();

        store.mark_sent(&[later.key()]).unwrap();

        let unsent = store.unsent().unwrap();
        assert_eq!(unsent.len(), 1);
        assert_eq!(unsent[0].triggered_at, t0);
    }

    #[test]
    fn test_timeout_store_passes_through() {
        let store = TimeoutStore::new(Arc::new(MemoryStore::new()), Duration::from_secs(2));
        let now = Utc::now();
        store.save(&[alert(AlertKind::Low, Some(1), now)]).unwrap();
        assert_eq!(store.unsent().unwrap().len(), 1);
    }

    #[test]
    fn test_timeout_store_times_out() {
        let slow = Arc::new(SlowStore::new(Duration::from_millis(500)));
        let store = TimeoutStore::new(slow, Duration::from_millis(20));

        let result = store.count_recent(AlertKind::Low, 1, Some(1), Utc::now());
        assert_eq!(result, Err(StoreError::Timeout(Duration::from_millis(20))));
    }
}

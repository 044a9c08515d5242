//! Mock implementations for testing
//!
//! Store doubles that fail, stall or count calls, plus small builders for
//! snapshot records.

use crate::alerts::{AlertStore, MemoryStore, SnapshotSource};
use crate::domain::{Alert, AlertKey, AlertKind, MeasurementPoint, Snapshot};
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

/// A subject record carrying only a win-odds reading
pub fn odds_point(id: i64, name: &str, odds: f64) -> MeasurementPoint {
    MeasurementPoint::new(Some(id))
        .with_name(name)
        .with_code(id.to_string())
        .with_field("win_odds", odds)
}

/// Store whose every call fails
#[derive(Debug, Default)]
pub struct FailingStore {
    calls: AtomicUsize,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of calls attempted so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> Result<T, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Unavailable("store offline".to_string()))
    }
}

impl SnapshotSource for FailingStore {
    fn previous(&self, _group_id: i64, _before: DateTime<Utc>) -> Result<Option<Snapshot>, StoreError> {
        self.fail()
    }
}

impl AlertStore for FailingStore {
    fn save(&self, _alerts: &[Alert]) -> Result<(), StoreError> {
        self.fail()
    }

    fn count_recent(
        &self,
        _kind: AlertKind,
        _group_id: i64,
        _subject_id: Option<i64>,
        _since: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        self.fail()
    }

    fn unsent(&self) -> Result<Vec<Alert>, StoreError> {
        self.fail()
    }

    fn mark_sent(&self, _keys: &[AlertKey]) -> Result<(), StoreError> {
        self.fail()
    }
}

/// In-memory store that counts `save` calls
#[derive(Debug, Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    saves: AtomicUsize,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_calls(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl SnapshotSource for RecordingStore {
    fn previous(&self, group_id: i64, before: DateTime<Utc>) -> Result<Option<Snapshot>, StoreError> {
        self.inner.previous(group_id, before)
    }
}

impl AlertStore for RecordingStore {
    fn save(&self, alerts: &[Alert]) -> Result<(), StoreError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(alerts)
    }

    fn count_recent(
        &self,
        kind: AlertKind,
        group_id: i64,
        subject_id: Option<i64>,
        since: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        self.inner.count_recent(kind, group_id, subject_id, since)
    }

    fn unsent(&self) -> Result<Vec<Alert>, StoreError> {
        self.inner.unsent()
    }

    fn mark_sent(&self, keys: &[AlertKey]) -> Result<(), StoreError> {
        self.inner.mark_sent(keys)
    }
}

/// In-memory store that sleeps before every call
#[derive(Debug)]
pub struct SlowStore {
    inner: MemoryStore,
    delay: Duration,
}

impl SlowStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MemoryStore::new(),
            delay,
        }
    }

    fn stall(&self) {
        thread::sleep(self.delay);
    }
}

impl SnapshotSource for SlowStore {
    fn previous(&self, group_id: i64, before: DateTime<Utc>) -> Result<Option<Snapshot>, StoreError> {
        self.stall();
        self.inner.previous(group_id, before)
    }
}

impl AlertStore for SlowStore {
    fn save(&self, alerts: &[Alert]) -> Result<(), StoreError> {
        self.stall();
        self.inner.save(alerts)
    }

    fn count_recent(
        &self,
        kind: AlertKind,
        group_id: i64,
        subject_id: Option<i64>,
        since: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        self.stall();
        self.inner.count_recent(kind, group_id, subject_id, since)
    }

    fn unsent(&self) -> Result<Vec<Alert>, StoreError> {
        self.stall();
        self.inner.unsent()
    }

    fn mark_sent(&self, keys: &[AlertKey]) -> Result<(), StoreError> {
        self.stall();
        self.inner.mark_sent(keys)
    }
}

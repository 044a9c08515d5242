//! Duplicate alert suppression
//!
//! Two tiers decide whether a candidate already fired inside the trailing
//! window:
//!
//! 1. An in-process map of fingerprint to last trigger time.
//! 2. On a cache miss, the durable alert store, which survives restarts.
//!
//! The final check-and-insert on the map happens under a single lock, so
//! two concurrent evaluations of one fingerprint can never both pass.
//! Entries older than the window are treated as absent whether or not they
//! have been evicted yet.

use super::clock::Clock;
use super::store::AlertStore;
use crate::domain::{AlertCandidate, Fingerprint};
use chrono::{DateTime, Utc};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Which tier withheld a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressedBy {
    Cache,
    Store,
}

/// Suppression decision for one candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allowed,
    Suppressed(SuppressedBy),
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Fingerprint-keyed, time-windowed suppressor
pub struct Suppressor {
    span: chrono::Duration,
    recent: Mutex<HashMap<Fingerprint, DateTime<Utc>>>,
    store: Arc<dyn AlertStore>,
    clock: Arc<dyn Clock>,
}

impl Suppressor {
    pub fn new(window: Duration, store: Arc<dyn AlertStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            span: chrono::Duration::from_std(window).unwrap_or(chrono::Duration::MAX),
            recent: Mutex::new(HashMap::new()),
            store,
            clock,
        }
    }

    /// Decide whether `candidate` is a duplicate, recording it when it is not.
    ///
    /// A failing durable check counts as "not suppressed": a possible
    /// duplicate is preferred over a lost alert.
    pub fn check_and_record(&self, candidate: &AlertCandidate) -> Verdict {
        let fingerprint = candidate.fingerprint();
        let now = self.clock.now();

        if self
            .lock()
            .get(&fingerprint)
            .is_some_and(|last| self.within_window(*last, now))
        {
            log::debug!("Suppressed {} {} (cached)", candidate.kind, fingerprint.short());
            return Verdict::Suppressed(SuppressedBy::Cache);
        }

        // Durable check runs without holding the map lock
        let since = now.checked_sub_signed(self.span).unwrap_or(DateTime::<Utc>::MIN_UTC);
        let context = &candidate.context;
        match self
            .store
            .count_recent(candidate.kind, context.group_id, context.subject_id, since)
        {
            Ok(0) => {}
            Ok(count) => {
                log::debug!(
                    "Suppressed {} {} ({} recent in store)",
                    candidate.kind,
                    fingerprint.short(),
                    count
                );
                return Verdict::Suppressed(SuppressedBy::Store);
            }
            Err(e) => {
                log::warn!(
                    "Suppression check failed for {} on {} at {}: {}; not suppressing",
                    candidate.kind,
                    context.subject_label(),
                    context.group_name,
                    e
                );
            }
        }

        let mut recent = self.lock();
        let verdict = match recent.entry(fingerprint) {
            Entry::Occupied(mut entry) => {
                if self.within_window(*entry.get(), now) {
                    Verdict::Suppressed(SuppressedBy::Cache)
                } else {
                    entry.insert(now);
                    Verdict::Allowed
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
                Verdict::Allowed
            }
        };

        if verdict.is_allowed() {
            recent.retain(|_, last| self.within_window(*last, now));
        }
        verdict
    }

    /// Forget a recorded fingerprint so the next candidate with it is checked afresh
    pub fn release(&self, fingerprint: &Fingerprint) -> bool {
        self.lock().remove(fingerprint).is_some()
    }

    /// Drop cache entries that have left the window; returns how many went
    pub fn evict_expired(&self) -> usize {
        let now = self.clock.now();
        let mut recent = self.lock();
        let before = recent.len();
        recent.retain(|_, last| self.within_window(*last, now));
        before - recent.len()
    }

    /// Number of fingerprints held in memory, expired or not
    pub fn cached_len(&self) -> usize {
        self.lock().len()
    }

    fn within_window(&self, last: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(last) < self.span
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Fingerprint, DateTime<Utc>>> {
        self.recent.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

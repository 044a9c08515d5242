//! Alert fingerprints
//!
//! A fingerprint identifies "the same alert" for suppression. It is derived
//! from kind, group, subject and threshold only, so an actual value that
//! oscillates around a threshold keeps producing the same fingerprint.

use super::alert::AlertKind;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Hex-encoded SHA-256 digest of an alert's identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the fingerprint for an alert identity
    pub fn compute(
        kind: AlertKind,
        group_id: i64,
        subject_id: Option<i64>,
        threshold: Option<f64>,
    ) -> Self {
        let subject = subject_id.map_or_else(|| "-".to_string(), |id| id.to_string());
        let threshold = threshold.map_or_else(|| "-".to_string(), |t| format!("{t:?}"));
        let key = format!("{}:{}:{}:{}", kind, group_id, subject, threshold);
        let digest = Sha256::digest(key.as_bytes());
        Self(format!("{digest:x}"))
    }

    /// The hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, for logs
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

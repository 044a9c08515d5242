//! Snapshot and measurement point types
//!
//! Snapshots are produced by the acquisition side and only read here.
//! Field values are kept as raw JSON so a malformed reading surfaces as a
//! [`DataError`] for the one evaluator that asked for it.

use crate::error::DataError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A batch of measurement points captured at one instant for one group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Group the subjects belong to (e.g. a race)
    pub group_id: i64,
    /// Display name of the group (e.g. a track name)
    #[serde(default)]
    pub group_name: String,
    /// Capture time
    pub captured_at: DateTime<Utc>,
    /// Subject records in presentation order
    #[serde(default)]
    pub subjects: Vec<MeasurementPoint>,
}

impl Snapshot {
    /// Create an empty snapshot
    pub fn new(group_id: i64, group_name: impl Into<String>, captured_at: DateTime<Utc>) -> Self {
        Self {
            group_id,
            group_name: group_name.into(),
            captured_at,
            subjects: Vec::new(),
        }
    }

    /// Append a subject record
    pub fn with_subject(mut self, point: MeasurementPoint) -> Self {
        self.subjects.push(point);
        self
    }

    /// Whether the snapshot has no subjects
    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    /// Find the record for the same subject as `point`.
    ///
    /// Records carrying a subject id match on it; records without one
    /// (group-wide entries such as combinations) match on display code.
    pub fn matching(&self, point: &MeasurementPoint) -> Option<&MeasurementPoint> {
        match (point.subject_id, point.display_code.as_deref()) {
            (Some(id), _) => self.subjects.iter().find(|p| p.subject_id == Some(id)),
            (None, Some(code)) => self
                .subjects
                .iter()
                .find(|p| p.subject_id.is_none() && p.display_code.as_deref() == Some(code)),
            (None, None) => None,
        }
    }
}

/// One subject's observed values
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MeasurementPoint {
    /// Subject identifier; absent for group-wide records
    #[serde(default)]
    pub subject_id: Option<i64>,
    /// Human-readable subject name
    #[serde(default)]
    pub display_name: Option<String>,
    /// Short display code (e.g. a program number)
    #[serde(default)]
    pub display_code: Option<String>,
    /// Named readings; any field may be absent
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

impl MeasurementPoint {
    /// Create a record for a subject
    pub fn new(subject_id: Option<i64>) -> Self {
        Self {
            subject_id,
            ..Self::default()
        }
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Set the display code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.display_code = Some(code.into());
        self
    }

    /// Set a raw field value
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Read a field as a number.
    ///
    /// Absent fields, `null`, empty strings and scratch markers read as
    /// `None`. Numeric strings and fractional odds (`"5/2"`, `"5-2"`,
    /// `"EVEN"`) are converted.
    pub fn number(&self, field: &str) -> Result<Option<f64>, DataError> {
        match self.fields.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => match n.as_f64() {
                Some(v) if v.is_finite() => Ok(Some(v)),
                _ => Err(malformed(field, format!("{n} is not a finite number"))),
            },
            Some(Value::String(s)) => parse_reading(field, s),
            Some(other) => Err(malformed(
                field,
                format!("expected a number, got {}", json_kind(other)),
            )),
        }
    }
}

fn parse_reading(field: &str, raw: &str) -> Result<Option<f64>, DataError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let upper = trimmed.to_ascii_uppercase();
    match upper.as_str() {
        "SCR" | "SCRATCH" | "SCRATCHED" => return Ok(None),
        "EVN" | "EVEN" => return Ok(Some(1.0)),
        _ => {}
    }

    let cleaned: String = trimmed.chars().filter(|c| *c != '$' && *c != ',').collect();

    for sep in ['/', '-'] {
        if let Some((num, den)) = cleaned.split_once(sep) {
            if is_digits(num) && is_digits(den) {
                let num: f64 = num
                    .parse()
                    .map_err(|_| malformed(field, format!("bad numerator in '{}'", raw)))?;
                let den: f64 = den
                    .parse()
                    .map_err(|_| malformed(field, format!("bad denominator in '{}'", raw)))?;
                if den == 0.0 {
                    return Err(malformed(field, format!("zero denominator in '{}'", raw)));
                }
                return Ok(Some(num / den));
            }
        }
    }

    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(malformed(field, format!("cannot read '{}' as a number", raw))),
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn malformed(field: &str, message: String) -> DataError {
    DataError::MalformedField {
        field: field.to_string(),
        message,
    }
}

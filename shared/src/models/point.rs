//! Timeseries point model.
//!
//! A `Point` is one timestamped record with a measurement name, indexed tags
//! and value fields. Points are rendered to InfluxDB line protocol for
//! writing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use thiserror::Error;

/// A scalar field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Boolean value.
    Boolean(bool),
    /// Signed integer value.
    Integer(i64),
    /// Floating point value.
    Float(f64),
    /// String value.
    String(String),
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// Errors that can occur when encoding a point.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PointError {
    /// The measurement name is empty.
    #[error("Measurement name cannot be empty")]
    EmptyMeasurement,

    /// The point has no writable fields.
    #[error("Point for measurement '{0}' has no fields")]
    NoFields(String),
}

/// A single timeseries point.
///
/// Tags and fields are kept in sorted maps so the encoded form is stable.
///
/// # Example
///
/// ```
/// use shared::models::Point;
/// use chrono::{TimeZone, Utc};
///
/// let ts = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
/// let point = Point::new("error_logs", ts)
///     .with_tag("service", "api")
///     .with_field("error", "timeout");
///
/// assert_eq!(
///     point.to_line_protocol().unwrap(),
///     "error_logs,service=api error=\"timeout\" 1700000000000000000"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Measurement name.
    pub measurement: String,

    /// Indexed, low-cardinality attributes.
    pub tags: BTreeMap<String, String>,

    /// Value payload.
    pub fields: BTreeMap<String, FieldValue>,

    /// Time the point was recorded.
    pub timestamp: DateTime<Utc>,
}

impl Point {
    /// Creates a point with no tags and no fields.
    #[must_use]
    pub fn new(measurement: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            measurement: measurement.into(),
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
            timestamp,
        }
    }

    /// Adds a tag.
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Adds a field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Encodes the point as one line of InfluxDB line protocol with a
    /// nanosecond timestamp.
    ///
    /// Tags with empty values and non-finite floats are skipped, since line
    /// protocol cannot represent them.
    ///
    /// # Errors
    ///
    /// Returns an error if the measurement is empty or no field can be written.
    pub fn to_line_protocol(&self) -> Result<String, PointError> {
        if self.measurement.is_empty() {
            return Err(PointError::EmptyMeasurement);
        }

        let mut line = String::new();
        push_escaped(&mut line, &self.measurement, &[',', ' ']);

        for (key, value) in self.tags.iter().filter(|(_, v)| !v.is_empty()) {
            line.push(',');
            push_escaped(&mut line, key, &[',', '=', ' ']);
            line.push('=');
            push_escaped(&mut line, value, &[',', '=', ' ']);
        }

        let mut separator = ' ';
        for (key, value) in &self.fields {
            if matches!(value, FieldValue::Float(f) if !f.is_finite()) {
                continue;
            }
            line.push(separator);
            separator = ',';
            push_escaped(&mut line, key, &[',', '=', ' ']);
            line.push('=');
            push_field_value(&mut line, value);
        }

        if separator == ' ' {
            return Err(PointError::NoFields(self.measurement.clone()));
        }

        let nanos = self.timestamp.timestamp_nanos_opt().unwrap_or(0);
        let _ = write!(line, " {nanos}");

        Ok(line)
    }
}

/// Appends `value`, backslash-escaping backslashes, `special` characters
/// and newlines.
fn push_escaped(out: &mut String, value: &str, special: &[char]) {
    for c in value.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\\' => out.push_str("\\\\"),
            c if special.contains(&c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
}

fn push_field_value(out: &mut String, value: &FieldValue) {
    match value {
        FieldValue::Boolean(b) => {
            let _ = write!(out, "{b}");
        }
        FieldValue::Integer(i) => {
            let _ = write!(out, "{i}i");
        }
        FieldValue::Float(f) => {
            let _ = write!(out, "{f}");
        }
        FieldValue::String(s) => {
            out.push('"');
            for c in s.chars() {
                if c == '"' || c == '\\' {
                    out.push('\\');
                }
                out.push(c);
            }
            out.push('"');
        }
    }
}

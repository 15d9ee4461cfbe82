//! Points and their line protocol encoding.
//!
//! Format: measurement,tag1=value1,tag2=value2 field1=value1,field2=value2 timestamp

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// A typed field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
    UInteger(u64),
    Bool(bool),
    String(String),
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<f32> for FieldValue {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        Self::UInteger(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PointError {
    #[error("Point has an empty measurement")]
    EmptyMeasurement,

    #[error("Point '{0}' has no writable fields")]
    NoFields(String),

    #[error("Timestamp {0} cannot be represented in nanoseconds")]
    TimestampOutOfRange(DateTime<Utc>),
}

/// A single timestamped measurement record.
///
/// Tags and fields are kept sorted by key, which is the order InfluxDB
/// prefers on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    measurement: String,
    tags: BTreeMap<String, String>,
    fields: BTreeMap<String, FieldValue>,
    timestamp: DateTime<Utc>,
}

impl Point {
    /// Create a point stamped with the current time.
    pub fn new(measurement: impl Into<String>) -> Self {
        Self {
            measurement: measurement.into(),
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Encode the point as one line of line protocol with a nanosecond timestamp.
    ///
    /// Tags with empty values and non-finite floats are skipped, as InfluxDB
    /// rejects both.
    ///
    /// # Errors
    ///
    /// Returns `PointError` if the measurement is empty, no field survives
    /// encoding, or the timestamp overflows nanoseconds.
    pub fn to_line_protocol(&self) -> Result<String, PointError> {
        if self.measurement.is_empty() {
            return Err(PointError::EmptyMeasurement);
        }

        let nanos = self
            .timestamp
            .timestamp_nanos_opt()
            .ok_or(PointError::TimestampOutOfRange(self.timestamp))?;

        let mut line = escape(&self.measurement, &[',', ' ']);

        for (key, value) in &self.tags {
            if key.is_empty() || value.is_empty() {
                continue;
            }
            line.push(',');
            line.push_str(&escape(key, &[',', '=', ' ']));
            line.push('=');
            line.push_str(&escape(value, &[',', '=', ' ']));
        }

        let mut fields = self
            .fields
            .iter()
            .filter(|(key, _)| !key.is_empty())
            .filter_map(|(key, value)| {
                encode_field_value(value)
                    .map(|encoded| format!("{}={encoded}", escape(key, &[',', '=', ' '])))
            })
            .peekable();

        if fields.peek().is_none() {
            return Err(PointError::NoFields(self.measurement.clone()));
        }

        line.push(' ');
        line.push_str(&fields.collect::<Vec<_>>().join(","));
        let _ = write!(line, " {nanos}");

        Ok(line)
    }
}

fn encode_field_value(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Float(v) if !v.is_finite() => None,
        FieldValue::Float(v) => Some(v.to_string()),
        FieldValue::Integer(v) => Some(format!("{v}i")),
        FieldValue::UInteger(v) => Some(format!("{v}u")),
        FieldValue::Bool(v) => Some(v.to_string()),
        FieldValue::String(v) => {
            let mut quoted = String::with_capacity(v.len() + 2);
            quoted.push('"');
            for c in v.chars() {
                match c {
                    '"' | '\\' => {
                        quoted.push('\\');
                        quoted.push(c);
                    }
                    '\n' => quoted.push_str("\\n"),
                    _ => quoted.push(c),
                }
            }
            quoted.push('"');
            Some(quoted)
        }
    }
}

fn escape(s: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '\n' {
            out.push_str("\\n");
            continue;
        }
        // A trailing backslash would otherwise escape the following separator.
        if c == '\\' || special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Encode several points, one per line.
///
/// # Errors
///
/// Returns the first `PointError` encountered.
pub fn to_line_protocol(points: &[Point]) -> Result<String, PointError> {
    points
        .iter()
        .map(Point::to_line_protocol)
        .collect::<Result<Vec<_>, _>>()
        .map(|lines| lines.join("\n"))
}

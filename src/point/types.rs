//! Store-facing point representation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

/// A scalar value attached to a point as a field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// 64-bit floating point.
    Float(f64),
    /// 64-bit signed integer.
    Integer(i64),
    /// UTF-8 string.
    String(String),
    /// Boolean value.
    Boolean(bool),
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
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

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

/// One timestamped, tagged-and-fielded record destined for the store.
///
/// Tags are low-cardinality string dimensions used for indexing; fields
/// carry the measured quantities. Tag keys and field keys live in disjoint
/// namespaces. A point must hold at least one field to be encodable; the
/// builders in this crate always satisfy that, and the wire encoder rejects
/// points that do not.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    /// Measurement (table) the point belongs to.
    pub measurement: String,
    /// Tag key/value pairs, ordered for deterministic encoding.
    pub tags: BTreeMap<String, String>,
    /// Field key/value pairs, ordered for deterministic encoding.
    pub fields: BTreeMap<String, FieldValue>,
    /// Point timestamp (UTC).
    pub timestamp: DateTime<Utc>,
}

impl Point {
    /// Create an empty point for the given measurement and timestamp.
    pub fn new(measurement: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            measurement: measurement.into(),
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
            timestamp,
        }
    }

    /// Attach a tag. Empty values are kept as-is.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Attach a field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

//! InfluxDB line-protocol encoding.
//!
//! One point becomes one line:
//!
//! ```text
//! measurement,tag1=val1,tag2=val2 field1=val1,field2=val2 timestamp_ns
//! ```
//!
//! See: <https://docs.influxdata.com/influxdb/v2/reference/syntax/line-protocol/>

use crate::point::{FieldValue, Point};
use crate::store::StoreError;

/// Encode a point as a single line-protocol line.
///
/// Tags and fields are emitted in key order (the point stores them in
/// ordered maps), producing a canonical encoding for identical points.
///
/// # Errors
/// Returns [`StoreError::EmptyFields`] for a point with an empty field map;
/// the wire format requires at least one field per line.
pub fn encode_point(point: &Point) -> Result<String, StoreError> {
    if point.fields.is_empty() {
        return Err(StoreError::EmptyFields {
            measurement: point.measurement.clone(),
        });
    }

    let mut line = escape_name(&point.measurement);

    for (key, value) in &point.tags {
        line.push(',');
        line.push_str(&escape_tag(key));
        line.push('=');
        line.push_str(&escape_tag(value));
    }

    line.push(' ');
    for (i, (key, value)) in point.fields.iter().enumerate() {
        if i > 0 {
            line.push(',');
        }
        line.push_str(&escape_tag(key));
        line.push('=');
        line.push_str(&encode_field_value(value));
    }

    line.push(' ');
    let nanos = point
        .timestamp
        .timestamp_nanos_opt()
        .unwrap_or_else(|| point.timestamp.timestamp_micros().saturating_mul(1000));
    line.push_str(&nanos.to_string());

    Ok(line)
}

/// Format a field value for the wire: floats as-is, integers with the `i`
/// suffix, strings double-quoted with inner quotes escaped, booleans as
/// `true`/`false`.
fn encode_field_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Float(v) => format!("{v}"),
        FieldValue::Integer(v) => format!("{v}i"),
        FieldValue::String(v) => {
            let escaped = v.replace('\\', "\\\\").replace('"', "\\\"");
            format!("\"{escaped}\"")
        }
        FieldValue::Boolean(v) => v.to_string(),
    }
}

/// Measurement names escape commas and spaces.
fn escape_name(s: &str) -> String {
    s.replace(',', "\\,").replace(' ', "\\ ")
}

/// Tag keys, tag values, and field keys escape commas, equals signs, and
/// spaces.
fn escape_tag(s: &str) -> String {
    s.replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}

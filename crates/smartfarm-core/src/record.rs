//! Decoding of raw device records.
//!
//! Records are stored by the network gateway at the device path in this shape:
//!
//! ```json
//! {
//!   "received_at": "2024-01-01T00:00:00Z",
//!   "uplink_message": {
//!     "decoded_payload": {
//!       "temperature": "21.3",
//!       "humidity": 55,
//!       "soil_moisture": "6.2",
//!       "light_intensity": "410"
//!     }
//!   }
//! }
//! ```
//!
//! Every payload field is optional and may be a JSON number or a numeric
//! string. A record without the `uplink_message.decoded_payload` object is a
//! handled case, not a parse error.

use serde_json::{Map, Value};
use time::OffsetDateTime;
use tracing::debug;

use smartfarm_types::{Metric, Reading, SensorValue, SensorValues, parse_timestamp};

/// Field every query is ordered by.
pub const RECEIVED_AT: &str = "received_at";

/// JSON pointer to the decoded payload object.
const PAYLOAD_POINTER: &str = "/uplink_message/decoded_payload";

/// The children returned for a query, in the order the source delivered them.
///
/// The source gives no ordering guarantee; consumers that need chronological
/// order must sort.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    children: Vec<(String, Value)>,
}

impl Snapshot {
    /// A snapshot with no records.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from `(key, record)` pairs.
    pub fn from_children(children: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self {
            children: children.into_iter().collect(),
        }
    }

    /// Build a snapshot from the JSON body of a query response.
    ///
    /// `null` means no records. Objects map push keys to records; arrays
    /// (which the database produces for integer-like keys) are keyed by index
    /// with `null` holes dropped.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Self::empty(),
            Value::Object(map) => Self::from_children(map),
            Value::Array(items) => Self::from_children(
                items
                    .into_iter()
                    .enumerate()
                    .filter(|(_, v)| !v.is_null())
                    .map(|(i, v)| (i.to_string(), v)),
            ),
            other => Self::from_children([(String::new(), other)]),
        }
    }

    /// Whether any record exists.
    pub fn exists(&self) -> bool {
        !self.children.is_empty()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether the snapshot holds no records.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// The records with their keys.
    pub fn children(&self) -> &[(String, Value)] {
        &self.children
    }

    /// The record with the greatest `received_at`.
    ///
    /// Records whose timestamp is absent or invalid rank below every dated
    /// record; among equals the later child wins.
    pub fn latest(&self) -> Option<&Value> {
        self.children
            .iter()
            .enumerate()
            .max_by_key(|(i, (_, record))| (received_at(record), *i))
            .map(|(_, (_, record))| record)
    }
}

/// Parse a payload field as a number.
///
/// Accepts JSON numbers and strings holding a finite decimal number.
/// Anything else (absent, `null`, booleans, text) is not a number.
pub fn numeric_field(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

fn decode_field(payload: &Map<String, Value>, metric: Metric) -> SensorValue {
    match numeric_field(payload.get(metric.payload_key())) {
        Some(v) => SensorValue::Numeric(metric.round(v)),
        None => SensorValue::Missing,
    }
}

/// Decode the four metric values of a record.
///
/// Returns `None` when the record lacks the decoded payload object. Fields
/// that are absent or non-numeric become [`SensorValue::Missing`].
pub fn decode_values(record: &Value) -> Option<SensorValues> {
    let payload = record.pointer(PAYLOAD_POINTER)?.as_object()?;
    Some(SensorValues {
        temperature: decode_field(payload, Metric::Temperature),
        humidity: decode_field(payload, Metric::Humidity),
        soil_moisture: decode_field(payload, Metric::SoilMoisture),
        light_intensity: decode_field(payload, Metric::LightIntensity),
    })
}

/// The record's `received_at` as an instant, if present and valid.
pub fn received_at(record: &Value) -> Option<OffsetDateTime> {
    let raw = record.get(RECEIVED_AT)?.as_str()?;
    match parse_timestamp(raw) {
        Ok(ts) => Some(ts),
        Err(e) => {
            debug!(error = %e, "Ignoring unparseable received_at");
            None
        }
    }
}

/// Decode a record for the historical path.
///
/// Only complete samples are plotted, so records lacking the decoded payload
/// or a valid timestamp yield `None`.
pub fn decode_reading(record: &Value) -> Option<Reading> {
    let values = decode_values(record)?;
    let timestamp = received_at(record)?;
    Some(Reading::new(timestamp, values))
}

//! Sensor readings and the timestamped payload published every cycle.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Text format of [`SensorPayload::sent`] (`YYYY-MM-DD HH:mm:ss.SSS`, UTC).
pub const SENT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// A single normalized sensor reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    /// Canonical sensor name (e.g. `[temp][cpu]_measure`).
    pub id: String,

    /// Reserved. Always serialized, currently always empty.
    #[serde(default)]
    pub label: String,

    /// The measured value.
    pub value: f64,
}

impl Sensor {
    /// Create a sensor with an empty label.
    pub fn new(id: impl Into<String>, value: f64) -> Self {
        Self {
            id: id.into(),
            label: String::new(),
            value,
        }
    }
}

/// The message published once per polling cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorPayload {
    /// When the payload was assembled.
    #[serde(with = "sent_format")]
    pub sent: DateTime<Utc>,

    /// Readings in publication order.
    pub payload: Vec<Sensor>,
}

impl SensorPayload {
    /// Wrap readings with the current UTC time.
    pub fn new(payload: Vec<Sensor>) -> Self {
        Self::at(current_timestamp(), payload)
    }

    /// Wrap readings with an explicit timestamp.
    pub fn at(sent: DateTime<Utc>, payload: Vec<Sensor>) -> Self {
        Self { sent, payload }
    }

    /// Look up a reading by canonical id.
    pub fn get(&self, id: &str) -> Option<&Sensor> {
        self.payload.iter().find(|s| s.id == id)
    }

    /// Number of readings.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Current UTC time truncated to millisecond precision.
///
/// Truncating up front keeps a payload equal to itself after a trip through
/// the wire format.
pub fn current_timestamp() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

/// Parse a `sent` field back into a UTC instant.
pub fn parse_sent(text: &str) -> crate::Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(text, SENT_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|source| crate::Error::Timestamp {
            text: text.to_string(),
            source,
        })
}

mod sent_format {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(sent: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&sent.format(super::SENT_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_sent(&text).map_err(serde::de::Error::custom)
    }
}

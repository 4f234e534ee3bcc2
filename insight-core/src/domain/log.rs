//! Log domain types

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Severity of a log record
///
/// Only the exact upper-case spellings `INFO`, `WARN` and `ERROR` are
/// recognised. Any other value read from a stored document is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Unknown(String),
}

impl LogLevel {
    /// Levels the generator draws from
    pub const GENERATED: [LogLevel; 3] = [LogLevel::Info, LogLevel::Warn, LogLevel::Error];

    /// Parse a level string, keeping unrecognised values as `Unknown`
    pub fn parse(raw: &str) -> Self {
        match raw {
            "INFO" => LogLevel::Info,
            "WARN" => LogLevel::Warn,
            "ERROR" => LogLevel::Error,
            other => LogLevel::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Unknown(raw) => raw,
        }
    }

    pub fn is_recognised(&self) -> bool {
        !matches!(self, LogLevel::Unknown(_))
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LogLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(LogLevel::parse(&raw))
    }
}

/// A log record as produced by the event source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    #[serde(with = "iso8601")]
    pub timestamp: DateTime<Utc>,
    pub service: String,
    pub trace_id: String,
}

impl LogRecord {
    /// Field map in the stored document layout
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("level".into(), Value::from(self.level.as_str()));
        fields.insert("message".into(), Value::from(self.message.as_str()));
        fields.insert("timestamp".into(), Value::from(format_timestamp(&self.timestamp)));
        fields.insert("service".into(), Value::from(self.service.as_str()));
        fields.insert("traceId".into(), Value::from(self.trace_id.as_str()));
        fields
    }
}

/// A stored log document as delivered by the live feed
///
/// The field map is whatever the persistence layer holds and is not
/// validated. `id` is assigned by storage and is only a stable key within
/// one rendering cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogDocument {
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl LogDocument {
    pub fn new(id: impl Into<String>, mut fields: Map<String, Value>) -> Self {
        fields.remove("id");
        Self {
            id: id.into(),
            fields,
        }
    }

    /// String value of a field, if present and a string
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn is_anomaly(&self) -> bool {
        self.fields
            .get("is_anomaly")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Format a timestamp the way records carry it on the wire
/// (`2024-05-01T12:05:10.123Z`)
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

mod iso8601 {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

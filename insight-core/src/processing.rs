//! Log processing
//!
//! Validates payloads before they are written to the processed-logs
//! collection and flags anomalous messages.

use serde_json::{Map, Value};
use thiserror::Error;

/// Message fragments (lowercase) that mark a log as anomalous
pub const ANOMALY_MARKERS: [&str; 3] = ["exception", "failed", "denied"];

const REQUIRED_FIELDS: [&str; 3] = ["message", "level", "timestamp"];

/// Reasons a log entry is skipped
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProcessingError {
    #[error("Entry has no nested JSON payload")]
    MissingPayload,

    #[error("Nested payload is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Payload is not a JSON object")]
    NotAnObject,

    #[error("Payload is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Payload field '{0}' must be a string")]
    NotAString(&'static str),
}

/// A validated payload ready for storage
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedLog {
    pub payload: Map<String, Value>,
    pub is_anomaly: bool,
}

impl ProcessedLog {
    /// Stored field map, including the `is_anomaly` flag
    pub fn into_fields(self) -> Map<String, Value> {
        let mut fields = self.payload;
        fields.insert("is_anomaly".into(), Value::Bool(self.is_anomaly));
        fields
    }
}

/// Pull the log payload out of a collector entry
///
/// The payload lives at `jsonPayload.message` and may be either an object
/// or a JSON-encoded string of one.
pub fn extract_payload(entry: &Value) -> Result<Map<String, Value>, ProcessingError> {
    let message = entry
        .get("jsonPayload")
        .and_then(|payload| payload.get("message"))
        .ok_or(ProcessingError::MissingPayload)?;

    match message {
        Value::Object(map) => Ok(map.clone()),
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(ProcessingError::NotAnObject),
            Err(e) => Err(ProcessingError::InvalidJson(e.to_string())),
        },
        _ => Err(ProcessingError::NotAnObject),
    }
}

/// Validate a payload and flag anomalies
pub fn process_payload(mut payload: Map<String, Value>) -> Result<ProcessedLog, ProcessingError> {
    for field in REQUIRED_FIELDS {
        if !payload.contains_key(field) {
            return Err(ProcessingError::MissingField(field));
        }
    }

    // snapshots are ordered by this field as text
    if !payload.get("timestamp").is_some_and(Value::is_string) {
        return Err(ProcessingError::NotAString("timestamp"));
    }

    let is_anomaly = payload
        .get("message")
        .and_then(Value::as_str)
        .is_some_and(is_anomalous);

    // storage assigns ids
    payload.remove("id");

    Ok(ProcessedLog {
        payload,
        is_anomaly,
    })
}

/// Extract and process a collector entry in one step
pub fn process_entry(entry: &Value) -> Result<ProcessedLog, ProcessingError> {
    process_payload(extract_payload(entry)?)
}

pub fn is_anomalous(message: &str) -> bool {
    let lower = message.to_lowercase();
    ANOMALY_MARKERS.iter().any(|marker| lower.contains(marker))
}

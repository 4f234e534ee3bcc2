//! Log DTOs for the Insight HTTP API

use serde::{Deserialize, Serialize};

use crate::domain::log::{LogLevel, LogRecord};

/// Response of `POST /api/generate-log`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateLogResponse {
    pub success: bool,
    pub log_generated: LogRecord,
}

/// Response of `POST /api/ingest`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    pub success: bool,
    pub id: String,
}

/// Body returned by any endpoint that failed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureResponse {
    pub success: bool,
    pub message: String,
}

impl FailureResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Query parameters of `GET /api/logs`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotQuery {
    pub limit: Option<usize>,
}

/// Structured log line written by the generator for each record
///
/// This is the shape a log collector picks up and later hands to
/// processing wrapped as `{"jsonPayload": {"message": ...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredLogLine {
    pub severity: LogLevel,
    pub message: LogRecord,
}

impl From<&LogRecord> for StructuredLogLine {
    fn from(record: &LogRecord) -> Self {
        Self {
            severity: record.level.clone(),
            message: record.clone(),
        }
    }
}

//! Log Service
//!
//! Business logic for producing, ingesting and reading processed logs.

use insight_core::aggregate::SNAPSHOT_LIMIT;
use insight_core::domain::log::{LogDocument, LogRecord};
use insight_core::dto::log::StructuredLogLine;
use insight_core::processing::{self, ProcessingError};
use serde_json::Value;
use thiserror::Error;

use crate::repository::{LogStore, StoreError};
use crate::state::AppState;

/// Service error type
#[derive(Debug, Error)]
pub enum LogError {
    #[error("Log entry skipped: {0}")]
    Skipped(#[from] ProcessingError),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, LogError>;

/// Generate one record, emit it and store its processed form
pub async fn generate_log(state: &AppState) -> Result<LogRecord> {
    let record = state.generator.lock().await.generate();

    emit_structured(&record);

    let processed = processing::process_payload(record.to_fields())?;
    let is_anomaly = processed.is_anomaly;
    let stored = state.store.insert(processed.into_fields()).await?;

    tracing::debug!(
        id = %stored.id,
        level = %record.level,
        is_anomaly,
        "Stored generated log"
    );

    Ok(record)
}

/// Process a collector entry and store it
pub async fn ingest_entry(store: &dyn LogStore, entry: &Value) -> Result<LogDocument> {
    let processed = processing::process_entry(entry).inspect_err(|e| {
        tracing::warn!("Skipping log entry: {}", e);
    })?;

    let stored = store.insert(processed.into_fields()).await?;

    tracing::debug!("Ingested log entry: {}", stored.id);

    Ok(stored)
}

/// Newest processed logs, newest first
pub async fn latest_logs(store: &dyn LogStore, limit: Option<usize>) -> Result<Vec<LogDocument>> {
    let logs = store.latest(clamp_limit(limit)).await?;
    Ok(logs)
}

/// Clamp a requested snapshot size to `1..=SNAPSHOT_LIMIT`
pub fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(SNAPSHOT_LIMIT).clamp(1, SNAPSHOT_LIMIT)
}

/// Write the record as a structured log line for collectors
fn emit_structured(record: &LogRecord) {
    match serde_json::to_string(&StructuredLogLine::from(record)) {
        Ok(line) => tracing::info!(target: "insight_server::generated", "{}", line),
        Err(e) => tracing::warn!("Failed to serialize generated log: {}", e),
    }
}

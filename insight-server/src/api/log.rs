//! Log API Handlers
//!
//! HTTP endpoints for generating, ingesting and listing processed logs.

use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use insight_core::domain::log::LogDocument;
use insight_core::dto::log::{GenerateLogResponse, IngestResponse, SnapshotQuery};
use serde_json::Value;

use crate::api::error::{ApiError, ApiResult};
use crate::service::log_service;
use crate::state::AppState;

/// POST /api/generate-log
/// Generate a single log on demand
pub async fn generate_log(
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<GenerateLogResponse>)> {
    tracing::info!("Manual log generation requested");

    let record = log_service::generate_log(&state).await.map_err(|e| {
        ApiError::InternalError(format!("Error in /api/generate-log: {}", e))
    })?;

    Ok((
        StatusCode::CREATED,
        Json(GenerateLogResponse {
            success: true,
            log_generated: record,
        }),
    ))
}

/// POST /api/ingest
/// Process and store a collector entry (`{"jsonPayload": {"message": ...}}`)
pub async fn ingest_log(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<IngestResponse>)> {
    let Json(entry) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let stored = log_service::ingest_entry(state.store.as_ref(), &entry).await?;

    Ok((
        StatusCode::CREATED,
        Json(IngestResponse {
            success: true,
            id: stored.id,
        }),
    ))
}

/// GET /api/logs
/// Newest processed logs, newest first
///
/// Query parameters:
/// - `limit` (optional): snapshot size, clamped to 1..=100
pub async fn list_logs(
    State(state): State<AppState>,
    params: Result<Query<SnapshotQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<LogDocument>>> {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    tracing::debug!("Listing logs (limit: {:?})", params.limit);

    let logs = log_service::latest_logs(state.store.as_ref(), params.limit).await?;

    Ok(Json(logs))
}

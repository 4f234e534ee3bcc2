//! Health Check API Handlers
//!
//! Liveness endpoints for monitoring.

use axum::{http::StatusCode, response::IntoResponse};

/// GET /
/// Plain-text banner
pub async fn banner() -> impl IntoResponse {
    (
        StatusCode::OK,
        "Log generator service is running. Check the service logs for output.",
    )
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

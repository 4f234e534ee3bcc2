//! API Module
//!
//! HTTP API layer for the server.
//! Each submodule handles endpoints for a specific domain.

pub mod error;
pub mod health;
pub mod log;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Service banner and health check
        .route("/", get(health::banner))
        .route("/health", get(health::health_check))
        // Log endpoints
        .route("/api/generate-log", post(log::generate_log))
        .route("/api/ingest", post(log::ingest_log))
        .route("/api/logs", get(log::list_logs))
        // Add state and middleware
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

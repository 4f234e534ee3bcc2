//! API Error Handling
//!
//! Unified error types and conversion for API responses. Every failure is
//! rendered as `{ "success": false, "message": ... }`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use insight_core::dto::log::FailureResponse;

use crate::repository::StoreError;
use crate::service::log_service::LogError;

/// Message returned for failures whose details stay server-side
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// API error type
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unprocessable(String),
    StorageError(StoreError),
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::StorageError(err) => {
                tracing::error!("Storage error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR_MESSAGE.to_string(),
                )
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR_MESSAGE.to_string(),
                )
            }
        };

        (status, Json(FailureResponse::new(message))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::StorageError(err)
    }
}

impl From<LogError> for ApiError {
    fn from(err: LogError) -> Self {
        match err {
            LogError::Skipped(e) => ApiError::Unprocessable(e.to_string()),
            LogError::Storage(e) => ApiError::StorageError(e),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

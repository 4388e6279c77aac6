//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::event_store::EventStoreError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    #[error("Version conflict: concurrent modification detected")]
    VersionConflict,

    // Domain errors
    #[error(transparent)]
    Domain(#[from] crate::domain::DomainError),

    // Infrastructure errors
    #[error(transparent)]
    EventStore(#[from] EventStoreError),

    #[error(transparent)]
    Projection(#[from] crate::projection::ProjectionError),

    #[error(transparent)]
    Outbox(#[from] crate::outbox::OutboxError),

    // Server errors (5xx)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = match &self {
            // 400 Bad Request
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", Some(msg.clone()))
            }

            // 404 Not Found
            AppError::PaymentNotFound(id) => {
                (StatusCode::NOT_FOUND, "payment_not_found", Some(id.clone()))
            }

            // 409 Conflict
            AppError::VersionConflict => (StatusCode::CONFLICT, "version_conflict", None),

            // Domain errors: status violations are conflicts
            AppError::Domain(domain_err) => (
                StatusCode::CONFLICT,
                "invalid_state",
                Some(domain_err.to_string()),
            ),

            // Event store: a concurrency conflict surfacing here means the
            // bounded retry was exhausted mid-flight
            AppError::EventStore(EventStoreError::ConcurrencyConflict { .. }) => {
                (StatusCode::CONFLICT, "version_conflict", None)
            }
            AppError::EventStore(e) => {
                tracing::error!("Event store error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "event_store_error", None)
            }

            AppError::Projection(e) => {
                tracing::error!("Projection error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "projection_error", None)
            }

            AppError::Outbox(e) => {
                tracing::error!("Outbox error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "outbox_error", None)
            }

            // 500 Internal Server Error
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
            AppError::Config(e) => {
                tracing::error!("Config error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "config_error", None)
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

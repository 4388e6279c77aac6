//! API Routes
//!
//! HTTP endpoint definitions. Commands commit before returning, so the
//! read model is queryable as soon as the call comes back.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::handlers::{
    ConfirmPaymentCommand, ConfirmPaymentHandler, InitiatePaymentCommand, InitiatePaymentHandler,
};

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Deserialize)]
pub struct InitiatePaymentRequest {
    pub payment_id: Uuid,
    pub amount: String,
    pub currency: String,
    pub user_id: String,
    pub correlation_id: String,
}

#[derive(Debug, Serialize)]
pub struct InitiatePaymentResponse {
    pub payment_id: Uuid,
    pub event_id: Uuid,
    pub message_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmPaymentRequest {
    pub correlation_id: String,
}

#[derive(Debug, Serialize)]
pub struct ConfirmPaymentResponse {
    pub payment_id: Uuid,
    pub event_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub payment_id: Uuid,
    pub status: String,
    pub amount: Decimal,
    pub currency: String,
    pub user_id: String,
    pub updated_at: DateTime<Utc>,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<PgPool> {
    Router::new()
        // Command endpoints
        .route("/payments/initiate", post(initiate_payment))
        .route("/payments/:payment_id/confirm", post(confirm_payment))
        // Query endpoint (read model)
        .route("/payments/:payment_id", get(get_payment))
}

/// Initiate a payment. Accepted once the unit of work has committed.
async fn initiate_payment(
    State(pool): State<PgPool>,
    Json(request): Json<InitiatePaymentRequest>,
) -> Result<(StatusCode, Json<InitiatePaymentResponse>), AppError> {
    let handler = InitiatePaymentHandler::new(pool);

    let command = InitiatePaymentCommand::new(
        request.payment_id,
        request.amount,
        request.currency,
        request.user_id,
        request.correlation_id,
    );

    let result = handler.execute(command).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(InitiatePaymentResponse {
            payment_id: result.payment_id,
            event_id: result.event_id,
            message_id: result.message_id,
        }),
    ))
}

/// Confirm a previously initiated payment
async fn confirm_payment(
    State(pool): State<PgPool>,
    Path(payment_id): Path<Uuid>,
    Json(request): Json<ConfirmPaymentRequest>,
) -> Result<Json<ConfirmPaymentResponse>, AppError> {
    let handler = ConfirmPaymentHandler::new(pool);

    let command = ConfirmPaymentCommand::new(payment_id, request.correlation_id);
    let result = handler.execute(command).await?;

    Ok(Json(ConfirmPaymentResponse {
        payment_id: result.payment_id,
        event_id: result.event_id,
    }))
}

/// Get the read-model row for a payment
async fn get_payment(
    State(pool): State<PgPool>,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<PaymentResponse>, AppError> {
    let row: Option<(Uuid, String, Decimal, String, String, DateTime<Utc>)> = sqlx::query_as(
        r#"
        SELECT payment_id, status, amount, currency, user_id, updated_at
        FROM payments_read
        WHERE payment_id = $1
        "#,
    )
    .bind(payment_id)
    .fetch_optional(&pool)
    .await?;

    let (payment_id, status, amount, currency, user_id, updated_at) =
        row.ok_or_else(|| AppError::PaymentNotFound(payment_id.to_string()))?;

    Ok(Json(PaymentResponse {
        payment_id,
        status,
        amount,
        currency,
        user_id,
        updated_at,
    }))
}

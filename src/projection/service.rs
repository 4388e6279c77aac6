//! Projection Service
//!
//! Updates the `payments_read` read model from events, inside the same
//! transaction as the event append. The read model never observes an event
//! that was not durably committed to the log, and the log never advances
//! without the read model reflecting it.
//!
//! Projection of a new event kind is enforced at compile time: the closed
//! `PaymentEvent` enum makes a missing arm a non-exhaustive match.

use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::domain::PaymentEvent;

/// Projection errors
#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    /// An event arrived for a read-model row that should already exist.
    /// Fatal: the log and the read model have diverged.
    #[error("No read-model row for payment {0}")]
    RowMissing(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Projector for the payments read model
#[derive(Debug, Clone)]
pub struct PaymentProjector;

impl PaymentProjector {
    pub fn new() -> Self {
        Self
    }

    /// Project one event into the read model. Idempotent per event.
    pub async fn project(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event: &PaymentEvent,
    ) -> Result<(), ProjectionError> {
        match event {
            PaymentEvent::PaymentInitiated {
                payment_id,
                amount,
                currency,
                user_id,
                ..
            } => {
                // Re-applying the same event when the row exists is a no-op
                let exists: bool = sqlx::query_scalar(
                    "SELECT EXISTS (SELECT 1 FROM payments_read WHERE payment_id = $1)",
                )
                .bind(payment_id)
                .fetch_one(&mut **tx)
                .await?;

                if exists {
                    tracing::debug!(%payment_id, "Read-model row already projected, skipping");
                    return Ok(());
                }

                sqlx::query(
                    r#"
                    INSERT INTO payments_read (payment_id, status, amount, currency, user_id, updated_at)
                    VALUES ($1, 'Initiated', $2, $3, $4, NOW())
                    "#,
                )
                .bind(payment_id)
                .bind(amount)
                .bind(currency)
                .bind(user_id)
                .execute(&mut **tx)
                .await?;
            }

            PaymentEvent::PaymentConfirmed { payment_id, .. } => {
                // UPDATE is idempotent by construction; a missing row means
                // the log advanced without the read model, which cannot
                // happen under single-transaction coupling.
                let rows_affected = sqlx::query(
                    r#"
                    UPDATE payments_read
                    SET status = 'Confirmed', updated_at = NOW()
                    WHERE payment_id = $1
                    "#,
                )
                .bind(payment_id)
                .execute(&mut **tx)
                .await?
                .rows_affected();

                if rows_affected == 0 {
                    return Err(ProjectionError::RowMissing(*payment_id));
                }
            }
        }

        Ok(())
    }
}

impl Default for PaymentProjector {
    fn default() -> Self {
        Self::new()
    }
}

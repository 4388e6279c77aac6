//! Payment Initiated Consumer
//!
//! Records an analytics fact for each distinct payment-initiated message.
//! The inbox check, the fact insert and the inbox record all run in one
//! transaction: the side effect exists if and only if the message identity
//! was recorded, so redelivery can never duplicate it.

use sqlx::PgPool;

use crate::contracts::PaymentInitiatedIntegration;
use crate::inbox::{InboxError, InboxRepository};

/// Outcome of handling one inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    /// First delivery: side effect performed and identity recorded
    Processed,
    /// Redelivery: successful no-op
    Duplicate,
}

/// Consumer errors
#[derive(Debug, thiserror::Error)]
pub enum ConsumerError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Inbox(#[from] InboxError),

    /// Inbound payload does not decode into the expected contract.
    /// The message is never recorded as processed.
    #[error("Undecodable inbound message: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Consumer for `PaymentInitiatedIntegration` messages
pub struct PaymentInitiatedConsumer {
    inbox: InboxRepository,
    pool: PgPool,
}

impl PaymentInitiatedConsumer {
    pub fn new(pool: PgPool) -> Self {
        Self {
            inbox: InboxRepository::new(pool.clone()),
            pool,
        }
    }

    /// Handle one inbound message, at most once per message identity.
    pub async fn handle(
        &self,
        message: &PaymentInitiatedIntegration,
    ) -> Result<Handled, ConsumerError> {
        let mut tx = self.pool.begin().await?;

        if self
            .inbox
            .already_processed(&mut tx, message.message_id)
            .await?
        {
            tracing::info!(
                message_id = %message.message_id,
                correlation_id = %message.correlation_id,
                "Duplicate ignored"
            );
            return Ok(Handled::Duplicate);
        }

        sqlx::query(
            r#"
            INSERT INTO analytics_payments (
                payment_id, amount, currency, user_id, correlation_id, recorded_at
            )
            VALUES ($1, $2, $3, $4, $5, NOW())
            "#,
        )
        .bind(message.payment_id)
        .bind(message.amount)
        .bind(&message.currency)
        .bind(&message.user_id)
        .bind(&message.correlation_id)
        .execute(&mut *tx)
        .await?;

        self.inbox.record(&mut tx, message.message_id).await?;

        tx.commit().await?;

        tracing::info!(
            payment_id = %message.payment_id,
            amount = %message.amount,
            correlation_id = %message.correlation_id,
            "Analytics fact recorded"
        );

        Ok(Handled::Processed)
    }
}

//! Confirm Payment Handler
//!
//! Same unit-of-work shape as initiation: load, rehydrate, command, append,
//! project, commit. Confirmation warrants no external notification, so
//! nothing is staged in the outbox.

use std::time::Duration;

use sqlx::PgPool;

use crate::aggregate::{Aggregate, Payment};
use crate::error::AppError;
use crate::event_store::{EventStore, EventStoreError};
use crate::projection::PaymentProjector;

use super::{ConfirmPaymentCommand, ConfirmPaymentResult};

const MAX_RETRIES: u32 = 3;

/// Handler for payment confirmation
pub struct ConfirmPaymentHandler {
    event_store: EventStore,
    projector: PaymentProjector,
    pool: PgPool,
}

impl ConfirmPaymentHandler {
    pub fn new(pool: PgPool) -> Self {
        Self {
            event_store: EventStore::new(pool.clone()),
            projector: PaymentProjector::new(),
            pool,
        }
    }

    /// Execute the confirm command
    pub async fn execute(
        &self,
        command: ConfirmPaymentCommand,
    ) -> Result<ConfirmPaymentResult, AppError> {
        for attempt in 0..MAX_RETRIES {
            match self.try_execute(&command).await {
                Err(AppError::EventStore(EventStoreError::ConcurrencyConflict { .. }))
                    if attempt + 1 < MAX_RETRIES =>
                {
                    let delay = Duration::from_millis(50 * (attempt as u64 + 1));
                    tokio::time::sleep(delay).await;
                    tracing::warn!(
                        payment_id = %command.payment_id,
                        "Concurrency conflict, retrying (attempt {}/{})",
                        attempt + 1,
                        MAX_RETRIES
                    );
                    continue;
                }
                // Still contended on the last attempt: give up
                Err(AppError::EventStore(EventStoreError::ConcurrencyConflict { .. })) => break,
                other => return other,
            }
        }

        Err(AppError::VersionConflict)
    }

    async fn try_execute(
        &self,
        command: &ConfirmPaymentCommand,
    ) -> Result<ConfirmPaymentResult, AppError> {
        let mut tx = self.pool.begin().await?;

        let (version, history) = self.event_store.load(&mut tx, command.payment_id).await?;
        let payment = Payment::rehydrate(&history);

        let event = payment.confirm()?;

        self.event_store
            .append(
                &mut tx,
                command.payment_id,
                version,
                std::slice::from_ref(&event),
                &command.correlation_id,
            )
            .await?;

        self.projector.project(&mut tx, &event).await?;

        tx.commit().await?;

        tracing::info!(
            payment_id = %command.payment_id,
            event_id = %event.event_id(),
            correlation_id = %command.correlation_id,
            "Payment confirmed"
        );

        Ok(ConfirmPaymentResult {
            payment_id: command.payment_id,
            event_id: event.event_id(),
        })
    }
}

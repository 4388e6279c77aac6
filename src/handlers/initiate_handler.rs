//! Initiate Payment Handler
//!
//! Orchestrates the full initiation unit of work in one transaction:
//! load stream, rehydrate, run the command, append with optimistic version
//! check, project the event, stage the outbound integration message, commit.
//! Nothing is visible unless everything committed.

use std::time::Duration;

use sqlx::PgPool;

use crate::aggregate::{Aggregate, Payment};
use crate::contracts::{PaymentInitiatedIntegration, PAYMENT_INITIATED_QUEUE};
use crate::domain::Amount;
use crate::error::AppError;
use crate::event_store::{EventStore, EventStoreError};
use crate::outbox::OutboxRepository;
use crate::projection::PaymentProjector;

use super::{InitiatePaymentCommand, InitiatePaymentResult};

/// Bounded retry for optimistic concurrency conflicts. Each attempt reloads
/// the stream from scratch; a stale aggregate is never retried blindly.
const MAX_RETRIES: u32 = 3;

/// Handler for payment initiation
pub struct InitiatePaymentHandler {
    event_store: EventStore,
    projector: PaymentProjector,
    outbox: OutboxRepository,
    pool: PgPool,
}

impl InitiatePaymentHandler {
    pub fn new(pool: PgPool) -> Self {
        Self {
            event_store: EventStore::new(pool.clone()),
            projector: PaymentProjector::new(),
            outbox: OutboxRepository::new(pool.clone()),
            pool,
        }
    }

    /// Execute the initiate command
    pub async fn execute(
        &self,
        command: InitiatePaymentCommand,
    ) -> Result<InitiatePaymentResult, AppError> {
        // Validate amount up front: no transaction, no state change
        let amount: Amount = command
            .amount
            .parse()
            .map_err(|e| AppError::InvalidRequest(format!("Invalid amount: {e}")))?;

        for attempt in 0..MAX_RETRIES {
            match self.try_execute(&command, &amount).await {
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

    /// One attempt = one transaction.
    async fn try_execute(
        &self,
        command: &InitiatePaymentCommand,
        amount: &Amount,
    ) -> Result<InitiatePaymentResult, AppError> {
        let mut tx = self.pool.begin().await?;

        let (version, history) = self.event_store.load(&mut tx, command.payment_id).await?;
        let payment = Payment::rehydrate(&history);

        let event = payment.initiate(
            command.payment_id,
            amount,
            command.currency.clone(),
            command.user_id.clone(),
        )?;

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

        // Initiation warrants external notification: stage exactly one
        // integration message with a fresh message id
        let message = PaymentInitiatedIntegration::new(
            command.correlation_id.clone(),
            command.payment_id,
            amount.value(),
            command.currency.clone(),
            command.user_id.clone(),
        );
        self.outbox
            .stage(&mut tx, message.message_id, PAYMENT_INITIATED_QUEUE, &message)
            .await?;

        tx.commit().await?;

        tracing::info!(
            payment_id = %command.payment_id,
            event_id = %event.event_id(),
            message_id = %message.message_id,
            correlation_id = %command.correlation_id,
            "Payment initiated"
        );

        Ok(InitiatePaymentResult {
            payment_id: command.payment_id,
            event_id: event.event_id(),
            message_id: message.message_id,
        })
    }
}

//! Consumer Runner
//!
//! Drives a consumer from its bus subscription. Failed messages are retried
//! over bounded backoff intervals; when retries are exhausted (or the
//! payload does not decode at all) the raw message is routed to the queue's
//! dead-letter destination for manual inspection, never retried forever and
//! never dropped.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::bus::MessageBus;
use crate::contracts::{dead_letter_queue, PaymentInitiatedIntegration, PAYMENT_INITIATED_QUEUE};

use super::PaymentInitiatedConsumer;

/// Backoff before each retry. Past the last interval, retries are exhausted.
const RETRY_INTERVALS: [Duration; 3] = [
    Duration::from_millis(200),
    Duration::from_secs(1),
    Duration::from_secs(5),
];

/// Subscription-driven runner for the analytics consumer
pub struct ConsumerRunner {
    consumer: PaymentInitiatedConsumer,
    bus: Arc<dyn MessageBus>,
}

impl ConsumerRunner {
    pub fn new(pool: PgPool, bus: Arc<dyn MessageBus>) -> Self {
        Self {
            consumer: PaymentInitiatedConsumer::new(pool),
            bus,
        }
    }

    /// Start the runner in the background.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(&self) {
        let mut rx = match self.bus.subscribe(PAYMENT_INITIATED_QUEUE).await {
            Ok(rx) => rx,
            Err(e) => {
                tracing::error!(error = %e, "Consumer could not subscribe, exiting");
                return;
            }
        };

        tracing::info!(queue = PAYMENT_INITIATED_QUEUE, "Consumer runner started");

        while let Some(payload) = rx.recv().await {
            self.process(payload).await;
        }

        tracing::info!(queue = PAYMENT_INITIATED_QUEUE, "Subscription closed, consumer exiting");
    }

    async fn process(&self, payload: serde_json::Value) {
        let message: PaymentInitiatedIntegration = match serde_json::from_value(payload.clone()) {
            Ok(m) => m,
            Err(e) => {
                tracing::error!(error = %e, "Inbound message does not decode, dead-lettering");
                self.dead_letter(payload).await;
                return;
            }
        };

        for (attempt, backoff) in RETRY_INTERVALS.iter().enumerate() {
            match self.consumer.handle(&message).await {
                Ok(_) => return,
                Err(e) => {
                    tracing::warn!(
                        message_id = %message.message_id,
                        error = %e,
                        "Consumer failed, retrying in {:?} (attempt {}/{})",
                        backoff,
                        attempt + 1,
                        RETRY_INTERVALS.len()
                    );
                    tokio::time::sleep(*backoff).await;
                }
            }
        }

        // Final attempt after the last backoff
        if let Err(e) = self.consumer.handle(&message).await {
            tracing::error!(
                message_id = %message.message_id,
                error = %e,
                "Retries exhausted, dead-lettering"
            );
            self.dead_letter(payload).await;
        }
    }

    async fn dead_letter(&self, payload: serde_json::Value) {
        let destination = dead_letter_queue(PAYMENT_INITIATED_QUEUE);
        if let Err(e) = self.bus.publish(&destination, payload).await {
            tracing::error!(error = %e, %destination, "Dead-letter publish failed");
        }
    }
}

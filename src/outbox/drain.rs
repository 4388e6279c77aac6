//! Outbox Drain
//!
//! Independently scheduled poll loop that hands staged messages to the bus.
//! Decoupled from request latency: staging is synchronous and fast, bus
//! hand-off lags by at most the poll interval.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tokio::time::interval;

use crate::bus::MessageBus;

use super::{OutboxError, OutboxRepository};

/// Sent rows older than this are purged by the drain loop.
const SENT_RETENTION_HOURS: i64 = 24;

/// How many poll ticks between retention sweeps.
const PURGE_EVERY_TICKS: u32 = 60;

/// Poll-driven publisher for staged outbox messages
pub struct OutboxDrain {
    repository: OutboxRepository,
    bus: Arc<dyn MessageBus>,
    poll_interval: Duration,
    batch_size: i64,
}

impl OutboxDrain {
    pub fn new(
        pool: PgPool,
        bus: Arc<dyn MessageBus>,
        poll_interval: Duration,
        batch_size: i64,
    ) -> Self {
        Self {
            repository: OutboxRepository::new(pool),
            bus,
            poll_interval,
            batch_size,
        }
    }

    /// Start the drain loop in the background.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(&self) {
        tracing::info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Outbox drain started"
        );

        let mut ticker = interval(self.poll_interval);
        let mut ticks: u32 = 0;

        loop {
            ticker.tick().await;
            ticks = ticks.wrapping_add(1);

            if let Err(e) = self.drain_once().await {
                tracing::error!(error = %e, "Outbox drain pass failed");
            }

            if ticks % PURGE_EVERY_TICKS == 0 {
                if let Err(e) = self
                    .repository
                    .purge_sent(chrono::Duration::hours(SENT_RETENTION_HOURS))
                    .await
                {
                    tracing::error!(error = %e, "Outbox purge failed");
                }
            }
        }
    }

    /// Publish one batch of pending messages in ascending stage order.
    ///
    /// Each message is marked sent only after the bus acknowledges it. A
    /// delivery failure stops the batch so a stream's messages are never
    /// reordered around the failed one; everything unsent stays pending and
    /// is retried on the next tick. Nothing is ever dropped.
    pub async fn drain_once(&self) -> Result<u64, OutboxError> {
        let pending = self.repository.fetch_pending(self.batch_size).await?;

        let mut sent = 0u64;
        for record in pending {
            match self
                .bus
                .publish(&record.destination, record.payload.clone())
                .await
            {
                Ok(()) => {
                    self.repository.mark_sent(record.message_id).await?;
                    sent += 1;

                    tracing::debug!(
                        message_id = %record.message_id,
                        destination = %record.destination,
                        "Outbox message handed to bus"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        message_id = %record.message_id,
                        destination = %record.destination,
                        error = %e,
                        "Bus unreachable, message stays pending"
                    );
                    break;
                }
            }
        }

        Ok(sent)
    }
}

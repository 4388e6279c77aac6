//! Inbox Repository
//!
//! Records processed inbound message identities so consumption is
//! idempotent under at-least-once delivery. The check and the write both
//! run inside the consumer's transaction, atomically with the side effect
//! they guard.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// A processed inbound message identity
#[derive(Debug, Clone)]
pub struct InboxRecord {
    pub message_id: Uuid,
    pub processed_at: DateTime<Utc>,
}

/// Inbox errors
#[derive(Debug, thiserror::Error)]
pub enum InboxError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Repository over the `inbox` table
#[derive(Debug, Clone)]
pub struct InboxRepository {
    pool: PgPool,
}

impl InboxRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Check whether a message identity has already been processed.
    pub async fn already_processed(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        message_id: Uuid,
    ) -> Result<bool, InboxError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM inbox WHERE message_id = $1)")
                .bind(message_id)
                .fetch_one(&mut **tx)
                .await?;

        Ok(exists)
    }

    /// Record a message identity inside the caller's transaction.
    /// Written exactly once per distinct message id; never mutated.
    pub async fn record(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        message_id: Uuid,
    ) -> Result<(), InboxError> {
        sqlx::query("INSERT INTO inbox (message_id, processed_at) VALUES ($1, NOW())")
            .bind(message_id)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Look up a processed entry (for auditing/tests).
    pub async fn get(&self, message_id: Uuid) -> Result<Option<InboxRecord>, InboxError> {
        let row: Option<(Uuid, DateTime<Utc>)> =
            sqlx::query_as("SELECT message_id, processed_at FROM inbox WHERE message_id = $1")
                .bind(message_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(message_id, processed_at)| InboxRecord {
            message_id,
            processed_at,
        }))
    }
}

//! Outbox Repository
//!
//! Staged outbound messages. A message staged inside a command transaction
//! exists if and only if that transaction commits; it is marked sent only
//! after the bus has acknowledged the hand-off. A crash between hand-off
//! and mark leaves the row pending, so the drain re-sends it: the outbox
//! gives at-least-once delivery and consumers must deduplicate.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Outbox delivery status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboxStatus {
    Pending,
    Sent,
}

impl From<String> for OutboxStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "sent" => OutboxStatus::Sent,
            _ => OutboxStatus::Pending,
        }
    }
}

impl std::fmt::Display for OutboxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutboxStatus::Pending => write!(f, "pending"),
            OutboxStatus::Sent => write!(f, "sent"),
        }
    }
}

/// A staged outbound message
#[derive(Debug, Clone)]
pub struct OutboxRecord {
    pub message_id: Uuid,
    pub destination: String,
    pub payload: serde_json::Value,
    pub status: OutboxStatus,
    pub staged_at: DateTime<Utc>,
    /// Monotone stage order; the drain processes ascending.
    pub position: i64,
}

/// Outbox errors
#[derive(Debug, thiserror::Error)]
pub enum OutboxError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Repository over the `outbox` table
#[derive(Debug, Clone)]
pub struct OutboxRepository {
    pool: PgPool,
}

impl OutboxRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Stage a message inside the caller's transaction.
    pub async fn stage<M: Serialize>(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        message_id: Uuid,
        destination: &str,
        message: &M,
    ) -> Result<Uuid, OutboxError> {
        let payload = serde_json::to_value(message)?;

        sqlx::query(
            r#"
            INSERT INTO outbox (message_id, destination, payload, status, staged_at)
            VALUES ($1, $2, $3, 'pending', NOW())
            "#,
        )
        .bind(message_id)
        .bind(destination)
        .bind(&payload)
        .execute(&mut **tx)
        .await?;

        Ok(message_id)
    }

    /// Fetch pending messages in ascending stage order.
    pub async fn fetch_pending(&self, limit: i64) -> Result<Vec<OutboxRecord>, OutboxError> {
        let rows: Vec<(Uuid, String, serde_json::Value, String, DateTime<Utc>, i64)> =
            sqlx::query_as(
                r#"
                SELECT message_id, destination, payload, status, staged_at, position
                FROM outbox
                WHERE status = 'pending'
                ORDER BY position ASC
                LIMIT $1
                "#,
            )
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(
                |(message_id, destination, payload, status, staged_at, position)| OutboxRecord {
                    message_id,
                    destination,
                    payload,
                    status: OutboxStatus::from(status),
                    staged_at,
                    position,
                },
            )
            .collect())
    }

    /// Mark a message sent after the bus acknowledged it.
    pub async fn mark_sent(&self, message_id: Uuid) -> Result<(), OutboxError> {
        sqlx::query("UPDATE outbox SET status = 'sent' WHERE message_id = $1")
            .bind(message_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Delete sent messages older than the retention window.
    pub async fn purge_sent(&self, retention: chrono::Duration) -> Result<u64, OutboxError> {
        let cutoff = Utc::now() - retention;

        let rows = sqlx::query("DELETE FROM outbox WHERE status = 'sent' AND staged_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows > 0 {
            tracing::info!(rows_deleted = rows, "Purged sent outbox messages");
        }

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outbox_status_from_string() {
        assert_eq!(OutboxStatus::from("pending".to_string()), OutboxStatus::Pending);
        assert_eq!(OutboxStatus::from("sent".to_string()), OutboxStatus::Sent);
        assert_eq!(OutboxStatus::from("garbage".to_string()), OutboxStatus::Pending);
    }

    #[test]
    fn test_outbox_status_display() {
        assert_eq!(OutboxStatus::Pending.to_string(), "pending");
        assert_eq!(OutboxStatus::Sent.to_string(), "sent");
    }
}

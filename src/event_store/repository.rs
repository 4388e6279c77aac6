//! Event Store Repository
//!
//! Append-only persistent log of domain events, one stream per payment.
//! Provides optimistic concurrency control: the unique index on
//! `(stream_id, stream_version)` is the sole arbiter between concurrent
//! writers; there is no check-then-act read.
//!
//! The store never commits. `load` and `append` take the caller's
//! transaction, so appending events is atomic with whatever else the
//! orchestrator does in the same unit of work.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::PaymentEvent;

use super::EventStoreError;

/// Stored event record from the database
#[derive(Debug, Clone)]
pub struct StoredEvent {
    pub global_position: i64,
    pub stream_id: String,
    pub stream_version: i64,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub occurred_at: DateTime<Utc>,
    pub correlation_id: String,
}

/// Event Store for persisting and retrieving payment events
#[derive(Debug, Clone)]
pub struct EventStore {
    pool: PgPool,
}

impl EventStore {
    /// Create a new EventStore with a database pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Stream identity for a payment, derived deterministically.
    pub fn stream_id(payment_id: Uuid) -> String {
        format!("payment-{payment_id}")
    }

    /// Load the full stream for a payment, ordered by version ascending.
    ///
    /// Returns `(current_version, events)` where `current_version` is the
    /// highest stored version, or 0 for an empty stream. A stored record
    /// whose type tag has no registered event kind fails the whole load
    /// with `UnknownEventType`.
    pub async fn load(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        payment_id: Uuid,
    ) -> Result<(i64, Vec<PaymentEvent>), EventStoreError> {
        let stream_id = Self::stream_id(payment_id);

        let rows: Vec<(i64, String, serde_json::Value)> = sqlx::query_as(
            r#"
            SELECT stream_version, event_type, payload
            FROM events
            WHERE stream_id = $1
            ORDER BY stream_version ASC
            "#,
        )
        .bind(&stream_id)
        .fetch_all(&mut **tx)
        .await?;

        let current_version = rows.last().map(|(v, _, _)| *v).unwrap_or(0);

        let mut events = Vec::with_capacity(rows.len());
        for (_, event_type, payload) in rows {
            events.push(deserialize_event(&event_type, payload)?);
        }

        Ok((current_version, events))
    }

    /// Append new events at versions `expected_version + 1 ..`.
    ///
    /// Rejected with `ConcurrencyConflict` if any claimed version already
    /// exists for the stream, detected by the unique index at insert time.
    pub async fn append(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        payment_id: Uuid,
        expected_version: i64,
        new_events: &[PaymentEvent],
        correlation_id: &str,
    ) -> Result<(), EventStoreError> {
        let stream_id = Self::stream_id(payment_id);

        let mut next_version = expected_version;
        for event in new_events {
            next_version += 1;

            let payload = serde_json::to_value(event)?;

            let result = sqlx::query(
                r#"
                INSERT INTO events (
                    stream_id, stream_version, event_type,
                    payload, occurred_at, correlation_id
                )
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(&stream_id)
            .bind(next_version)
            .bind(event.event_type())
            .bind(&payload)
            .bind(event.occurred_at())
            .bind(correlation_id)
            .execute(&mut **tx)
            .await;

            if let Err(e) = result {
                if is_unique_violation(&e) {
                    return Err(EventStoreError::ConcurrencyConflict {
                        stream_id,
                        version: next_version,
                    });
                }
                return Err(e.into());
            }
        }

        Ok(())
    }

    /// Get all stored records for a payment's stream (for auditing/tests).
    pub async fn get_events(&self, payment_id: Uuid) -> Result<Vec<StoredEvent>, EventStoreError> {
        let stream_id = Self::stream_id(payment_id);

        let rows: Vec<(i64, String, i64, String, serde_json::Value, DateTime<Utc>, String)> =
            sqlx::query_as(
                r#"
                SELECT global_position, stream_id, stream_version, event_type,
                       payload, occurred_at, correlation_id
                FROM events
                WHERE stream_id = $1
                ORDER BY stream_version ASC
                "#,
            )
            .bind(&stream_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(
                |(global_position, stream_id, stream_version, event_type, payload, occurred_at, correlation_id)| {
                    StoredEvent {
                        global_position,
                        stream_id,
                        stream_version,
                        event_type,
                        payload,
                        occurred_at,
                        correlation_id,
                    }
                },
            )
            .collect())
    }
}

/// Explicit registry keyed on the stable type tag.
/// An unknown tag is fatal, never silently skipped.
fn deserialize_event(
    event_type: &str,
    payload: serde_json::Value,
) -> Result<PaymentEvent, EventStoreError> {
    match event_type {
        "PaymentInitiated" | "PaymentConfirmed" => Ok(serde_json::from_value(payload)?),
        other => Err(EventStoreError::UnknownEventType(other.to_string())),
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EVENT_SCHEMA_VERSION;
    use rust_decimal_macros::dec;

    #[test]
    fn test_stream_id_is_deterministic() {
        let payment_id: Uuid = "6f1b9f9a-0000-0000-0000-000000000001".parse().unwrap();
        assert_eq!(
            EventStore::stream_id(payment_id),
            "payment-6f1b9f9a-0000-0000-0000-000000000001"
        );
    }

    #[test]
    fn test_deserialize_known_tag() {
        let event = PaymentEvent::PaymentInitiated {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            schema_version: EVENT_SCHEMA_VERSION,
            payment_id: Uuid::new_v4(),
            amount: dec!(100),
            currency: "USD".to_string(),
            user_id: "U1".to_string(),
        };
        let payload = serde_json::to_value(&event).unwrap();

        let restored = deserialize_event("PaymentInitiated", payload).unwrap();
        assert_eq!(restored, event);
    }

    #[test]
    fn test_deserialize_unknown_tag_is_fatal() {
        let result = deserialize_event("PaymentRefunded", serde_json::json!({}));
        assert!(matches!(
            result,
            Err(EventStoreError::UnknownEventType(t)) if t == "PaymentRefunded"
        ));
    }
}

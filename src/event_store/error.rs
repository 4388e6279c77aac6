//! Event Store Errors
//!
//! Error types for event store operations.

/// Errors that can occur in the event store
#[derive(Debug, thiserror::Error)]
pub enum EventStoreError {
    /// Optimistic concurrency conflict: another writer already appended at
    /// one of the versions this write claimed.
    #[error("Concurrency conflict on stream {stream_id}: version {version} already written")]
    ConcurrencyConflict { stream_id: String, version: i64 },

    /// A stored record carries a type tag with no registered event kind.
    /// Fatal: indicates a deployment/versioning defect, never skipped.
    #[error("Unknown domain event type: {0}")]
    UnknownEventType(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EventStoreError {
    /// Check if this error is a concurrency conflict
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, EventStoreError::ConcurrencyConflict { .. })
    }
}

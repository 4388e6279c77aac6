//! Outbox module
//!
//! Transactional outbox: a message enqueued during a transaction is
//! delivered to the bus if and only if that transaction commits, and is not
//! lost if the process crashes after commit but before send.

mod drain;
mod repository;

pub use drain::OutboxDrain;
pub use repository::{OutboxError, OutboxRecord, OutboxRepository, OutboxStatus};

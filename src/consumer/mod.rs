//! Integration Consumer module
//!
//! Consumes inbound integration messages with inbox deduplication:
//! each consumer's side effect runs at most once per message identity,
//! even under redelivery.

mod payment_initiated;
mod runner;

pub use payment_initiated::{ConsumerError, Handled, PaymentInitiatedConsumer};
pub use runner::ConsumerRunner;

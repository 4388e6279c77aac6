//! Command Handlers module
//!
//! CQRS command handlers that orchestrate business operations.
//! Each handler owns the transaction boundary: one attempt is one atomic
//! unit covering event append, read-model projection and outbox staging.

mod commands;
mod confirm_handler;
mod initiate_handler;

pub use commands::{
    ConfirmPaymentCommand, ConfirmPaymentResult, InitiatePaymentCommand, InitiatePaymentResult,
};
pub use confirm_handler::ConfirmPaymentHandler;
pub use initiate_handler::InitiatePaymentHandler;

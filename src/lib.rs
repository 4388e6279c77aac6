//! payments_es Library
//!
//! Re-exports modules for integration testing and external use.

pub mod aggregate;
pub mod api;
pub mod bus;
pub mod consumer;
pub mod contracts;
pub mod domain;
pub mod event_store;
pub mod handlers;
pub mod inbox;
pub mod outbox;
pub mod projection;

// Used by the main.rs binary and tests
pub mod config;
pub mod db;
mod error;

pub use config::Config;
pub use domain::{Amount, AmountError, DomainError, PaymentEvent};
pub use error::{AppError, AppResult};

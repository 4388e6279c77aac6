//! Domain module
//!
//! Pure domain types: events, value objects and domain errors.
//! Nothing in here performs I/O.

mod amount;
mod error;
mod events;

pub use amount::{Amount, AmountError};
pub use error::DomainError;
pub use events::{PaymentEvent, EVENT_SCHEMA_VERSION};

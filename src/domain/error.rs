//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure. Amount
//! validity is enforced by the `Amount` newtype at construction, so the
//! aggregate only ever reports status violations.

use thiserror::Error;

use crate::aggregate::PaymentStatus;

/// Business rule violations and domain invariant failures.
/// Independent of the web/infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Command is not valid for the aggregate's current status
    #[error("Cannot {operation} a payment in status {status}")]
    InvalidState {
        operation: &'static str,
        status: PaymentStatus,
    },
}

impl DomainError {
    pub fn invalid_state(operation: &'static str, status: PaymentStatus) -> Self {
        Self::InvalidState { operation, status }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_state_error() {
        let err = DomainError::invalid_state("initiate", PaymentStatus::Initiated);

        assert!(err.to_string().contains("initiate"));
        assert!(err.to_string().contains("Initiated"));
    }
}

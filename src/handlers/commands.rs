//! Command definitions
//!
//! Commands represent intentions to change the system state.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Command to initiate a payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiatePaymentCommand {
    pub payment_id: Uuid,
    /// Amount as string for precise decimal handling
    pub amount: String,
    pub currency: String,
    pub user_id: String,
    pub correlation_id: String,
}

impl InitiatePaymentCommand {
    pub fn new(
        payment_id: Uuid,
        amount: String,
        currency: String,
        user_id: String,
        correlation_id: String,
    ) -> Self {
        Self {
            payment_id,
            amount,
            currency,
            user_id,
            correlation_id,
        }
    }
}

/// Command to confirm a previously initiated payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmPaymentCommand {
    pub payment_id: Uuid,
    pub correlation_id: String,
}

impl ConfirmPaymentCommand {
    pub fn new(payment_id: Uuid, correlation_id: String) -> Self {
        Self {
            payment_id,
            correlation_id,
        }
    }
}

/// Result of a successful initiation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiatePaymentResult {
    pub payment_id: Uuid,
    pub event_id: Uuid,
    /// Identity of the staged outbound integration message
    pub message_id: Uuid,
}

/// Result of a successful confirmation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmPaymentResult {
    pub payment_id: Uuid,
    pub event_id: Uuid,
}

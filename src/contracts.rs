//! Integration contracts
//!
//! Wire shapes shared with other services over the message bus.
//! Every message carries its own fresh `message_id`; consumers key their
//! inbox on it, never on the domain event id.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Contract version stamped on outbound messages.
pub const CONTRACT_VERSION: i32 = 1;

/// Destination queue for payment-initiated notifications.
pub const PAYMENT_INITIATED_QUEUE: &str = "analytics-payment-initiated";

/// Published when a payment has been initiated and committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentInitiatedIntegration {
    pub message_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub correlation_id: String,
    pub version: i32,
    pub payment_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub user_id: String,
}

impl PaymentInitiatedIntegration {
    /// Build an outbound message for a committed initiation.
    /// The `message_id` is fresh per message, distinct from the event id.
    pub fn new(
        correlation_id: String,
        payment_id: Uuid,
        amount: Decimal,
        currency: String,
        user_id: String,
    ) -> Self {
        Self {
            message_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            correlation_id,
            version: CONTRACT_VERSION,
            payment_id,
            amount,
            currency,
            user_id,
        }
    }
}

/// Dead-letter destination for a queue, matching the broker convention.
pub fn dead_letter_queue(queue: &str) -> String {
    format!("{queue}_error")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_message_id_is_fresh_per_message() {
        let a = PaymentInitiatedIntegration::new(
            "corr-1".to_string(),
            Uuid::new_v4(),
            dec!(10),
            "USD".to_string(),
            "U1".to_string(),
        );
        let b = PaymentInitiatedIntegration::new(
            "corr-1".to_string(),
            a.payment_id,
            dec!(10),
            "USD".to_string(),
            "U1".to_string(),
        );
        assert_ne!(a.message_id, b.message_id);
    }

    #[test]
    fn test_wire_shape_roundtrip() {
        let msg = PaymentInitiatedIntegration::new(
            "corr-xyz".to_string(),
            Uuid::new_v4(),
            dec!(99.95),
            "EUR".to_string(),
            "U7".to_string(),
        );
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["version"], 1);
        assert_eq!(json["correlation_id"], "corr-xyz");

        let back: PaymentInitiatedIntegration = serde_json::from_value(json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_dead_letter_queue_name() {
        assert_eq!(
            dead_letter_queue(PAYMENT_INITIATED_QUEUE),
            "analytics-payment-initiated_error"
        );
    }
}

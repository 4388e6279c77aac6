//! Domain Events
//!
//! Event definitions for Event Sourcing.
//! Events are immutable facts that have happened in the system.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Schema version stamped on every new event.
pub const EVENT_SCHEMA_VERSION: i32 = 1;

/// Payment lifecycle events
///
/// A closed tagged union: deserialization dispatches on the stored
/// `event_type` tag against an explicit registry (see the event store),
/// never on type-name inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PaymentEvent {
    /// A payment was initiated
    PaymentInitiated {
        event_id: Uuid,
        occurred_at: DateTime<Utc>,
        schema_version: i32,
        payment_id: Uuid,
        amount: Decimal,
        currency: String,
        user_id: String,
    },

    /// A previously initiated payment was confirmed
    PaymentConfirmed {
        event_id: Uuid,
        occurred_at: DateTime<Utc>,
        schema_version: i32,
        payment_id: Uuid,
    },
}

impl PaymentEvent {
    /// Stable type tag under which this event is stored.
    pub fn event_type(&self) -> &'static str {
        match self {
            PaymentEvent::PaymentInitiated { .. } => "PaymentInitiated",
            PaymentEvent::PaymentConfirmed { .. } => "PaymentConfirmed",
        }
    }

    /// Unique identity of this event instance.
    pub fn event_id(&self) -> Uuid {
        match self {
            PaymentEvent::PaymentInitiated { event_id, .. } => *event_id,
            PaymentEvent::PaymentConfirmed { event_id, .. } => *event_id,
        }
    }

    /// The payment this event relates to.
    pub fn payment_id(&self) -> Uuid {
        match self {
            PaymentEvent::PaymentInitiated { payment_id, .. } => *payment_id,
            PaymentEvent::PaymentConfirmed { payment_id, .. } => *payment_id,
        }
    }

    /// When this event occurred.
    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            PaymentEvent::PaymentInitiated { occurred_at, .. } => *occurred_at,
            PaymentEvent::PaymentConfirmed { occurred_at, .. } => *occurred_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_event_serialization() {
        let event = PaymentEvent::PaymentInitiated {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            schema_version: EVENT_SCHEMA_VERSION,
            payment_id: Uuid::new_v4(),
            amount: Decimal::new(100, 0),
            currency: "USD".to_string(),
            user_id: "U1".to_string(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"PaymentInitiated""#));

        let deserialized: PaymentEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deserialized);
    }

    #[test]
    fn test_event_type_tags_are_stable() {
        let initiated = PaymentEvent::PaymentInitiated {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            schema_version: EVENT_SCHEMA_VERSION,
            payment_id: Uuid::new_v4(),
            amount: Decimal::ONE,
            currency: "EUR".to_string(),
            user_id: "U2".to_string(),
        };
        assert_eq!(initiated.event_type(), "PaymentInitiated");

        let confirmed = PaymentEvent::PaymentConfirmed {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            schema_version: EVENT_SCHEMA_VERSION,
            payment_id: Uuid::new_v4(),
        };
        assert_eq!(confirmed.event_type(), "PaymentConfirmed");
    }
}

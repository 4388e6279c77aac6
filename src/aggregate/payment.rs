//! Payment Aggregate
//!
//! Payment is the consistency boundary for a single payment's lifecycle.
//! State is derived from events, never directly mutated: commands are pure
//! and return the event they produce; the orchestrator owns persisting it
//! and applying it back. There is no uncommitted-events buffer.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Amount, DomainError, PaymentEvent, EVENT_SCHEMA_VERSION};

use super::Aggregate;

/// Payment lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// No events applied yet; the payment does not exist
    None,
    Initiated,
    Confirmed,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        Self::None
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::None => write!(f, "None"),
            PaymentStatus::Initiated => write!(f, "Initiated"),
            PaymentStatus::Confirmed => write!(f, "Confirmed"),
        }
    }
}

/// Payment Aggregate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Payment {
    payment_id: Uuid,
    status: PaymentStatus,
    amount: Decimal,
    currency: String,
    user_id: String,

    /// Number of events applied
    version: i64,
}

impl Payment {
    /// Initiate the payment.
    ///
    /// Fails with `InvalidState` if the payment already exists (status is
    /// anything but `None`). Returns the produced event without applying it;
    /// the caller decides when to fold it back in.
    pub fn initiate(
        &self,
        payment_id: Uuid,
        amount: &Amount,
        currency: String,
        user_id: String,
    ) -> Result<PaymentEvent, DomainError> {
        if self.status != PaymentStatus::None {
            return Err(DomainError::invalid_state("initiate", self.status));
        }

        Ok(PaymentEvent::PaymentInitiated {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            schema_version: EVENT_SCHEMA_VERSION,
            payment_id,
            amount: amount.value(),
            currency,
            user_id,
        })
    }

    /// Confirm a previously initiated payment.
    ///
    /// Fails with `InvalidState` unless the payment is currently `Initiated`.
    pub fn confirm(&self) -> Result<PaymentEvent, DomainError> {
        if self.status != PaymentStatus::Initiated {
            return Err(DomainError::invalid_state("confirm", self.status));
        }

        Ok(PaymentEvent::PaymentConfirmed {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            schema_version: EVENT_SCHEMA_VERSION,
            payment_id: self.payment_id,
        })
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

impl Aggregate for Payment {
    type Event = PaymentEvent;

    fn aggregate_type() -> &'static str {
        "Payment"
    }

    fn id(&self) -> Uuid {
        self.payment_id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(mut self, event: Self::Event) -> Self {
        match event {
            PaymentEvent::PaymentInitiated {
                payment_id,
                amount,
                currency,
                user_id,
                ..
            } => {
                self.payment_id = payment_id;
                self.amount = amount;
                self.currency = currency;
                self.user_id = user_id;
                self.status = PaymentStatus::Initiated;
            }

            PaymentEvent::PaymentConfirmed { .. } => {
                self.status = PaymentStatus::Confirmed;
            }
        }

        self.version += 1;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn initiated_payment() -> (Payment, PaymentEvent) {
        let payment_id = Uuid::new_v4();
        let amount = Amount::new(dec!(100)).unwrap();
        let event = Payment::default()
            .initiate(payment_id, &amount, "USD".to_string(), "U1".to_string())
            .unwrap();
        let payment = Payment::default().apply(event.clone());
        (payment, event)
    }

    #[test]
    fn test_initiate_produces_event_and_state() {
        let (payment, event) = initiated_payment();

        assert!(matches!(event, PaymentEvent::PaymentInitiated { .. }));
        assert_eq!(payment.status(), PaymentStatus::Initiated);
        assert_eq!(payment.amount(), dec!(100));
        assert_eq!(payment.currency(), "USD");
        assert_eq!(payment.user_id(), "U1");
        assert_eq!(payment.version(), 1);
    }

    #[test]
    fn test_double_initiate_rejected() {
        let (payment, _) = initiated_payment();
        let amount = Amount::new(dec!(50)).unwrap();

        let result = payment.initiate(
            payment.id(),
            &amount,
            "USD".to_string(),
            "U1".to_string(),
        );

        assert!(matches!(result, Err(DomainError::InvalidState { .. })));
        // State untouched
        assert_eq!(payment.version(), 1);
        assert_eq!(payment.amount(), dec!(100));
    }

    #[test]
    fn test_confirm_after_initiate() {
        let (payment, _) = initiated_payment();

        let event = payment.confirm().unwrap();
        assert!(matches!(event, PaymentEvent::PaymentConfirmed { .. }));
        assert_eq!(event.payment_id(), payment.id());

        let payment = payment.apply(event);
        assert_eq!(payment.status(), PaymentStatus::Confirmed);
        assert_eq!(payment.version(), 2);
    }

    #[test]
    fn test_confirm_without_initiate_rejected() {
        let payment = Payment::default();
        let result = payment.confirm();
        assert!(matches!(
            result,
            Err(DomainError::InvalidState {
                operation: "confirm",
                status: PaymentStatus::None,
            })
        ));
    }

    #[test]
    fn test_confirm_twice_rejected() {
        let (payment, _) = initiated_payment();
        let confirmed = payment.confirm().unwrap();
        let payment = payment.apply(confirmed);

        let result = payment.confirm();
        assert!(matches!(result, Err(DomainError::InvalidState { .. })));
    }

    #[test]
    fn test_rehydration_determinism() {
        let (live, initiated) = initiated_payment();
        let confirmed = live.confirm().unwrap();
        let live = live.apply(confirmed.clone());

        let history = vec![initiated, confirmed];
        let rehydrated = Payment::rehydrate(&history);

        assert_eq!(rehydrated.id(), live.id());
        assert_eq!(rehydrated.status(), live.status());
        assert_eq!(rehydrated.amount(), live.amount());
        assert_eq!(rehydrated.currency(), live.currency());
        assert_eq!(rehydrated.user_id(), live.user_id());
        assert_eq!(rehydrated.version(), live.version());
    }

    #[test]
    fn test_rehydrate_empty_history_is_none() {
        let payment = Payment::rehydrate(&[]);
        assert_eq!(payment.status(), PaymentStatus::None);
        assert_eq!(payment.version(), 0);
    }
}

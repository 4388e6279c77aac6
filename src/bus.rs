//! Message bus contract
//!
//! The broker transport is an external collaborator. The core only needs
//! two guarantees from it: `publish` hands a message off reliably, and a
//! subscription delivers each published message at least once (duplicates
//! and cross-stream reordering allowed). `InMemoryBus` satisfies both for
//! in-process wiring and tests; a real broker adapter implements the same
//! trait.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Errors surfaced by a bus implementation
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// The destination can no longer accept messages.
    #[error("Delivery failure on destination '{0}'")]
    DeliveryFailure(String),

    /// The destination already has an active subscriber.
    #[error("Destination '{0}' is already subscribed")]
    AlreadySubscribed(String),
}

/// Reliable publish / at-least-once delivery contract.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Hand a message off to the bus. Returning `Ok` means the bus has
    /// accepted responsibility for delivery.
    async fn publish(&self, destination: &str, payload: serde_json::Value)
        -> Result<(), BusError>;

    /// Obtain the delivery stream for a destination. Messages published
    /// before the subscription are buffered, not lost.
    async fn subscribe(
        &self,
        destination: &str,
    ) -> Result<mpsc::UnboundedReceiver<serde_json::Value>, BusError>;
}

struct Channel {
    sender: mpsc::UnboundedSender<serde_json::Value>,
    /// Present until a consumer claims the destination.
    receiver: Option<mpsc::UnboundedReceiver<serde_json::Value>>,
}

impl Channel {
    fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Some(receiver),
        }
    }
}

/// In-process bus backed by unbounded channels, one per destination.
#[derive(Default)]
pub struct InMemoryBus {
    channels: Mutex<HashMap<String, Channel>>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageBus for InMemoryBus {
    async fn publish(
        &self,
        destination: &str,
        payload: serde_json::Value,
    ) -> Result<(), BusError> {
        // The map stays consistent even if a holder panicked mid-access,
        // so a poisoned lock is recoverable
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        let channel = channels
            .entry(destination.to_string())
            .or_insert_with(Channel::new);

        channel
            .sender
            .send(payload)
            .map_err(|_| BusError::DeliveryFailure(destination.to_string()))
    }

    async fn subscribe(
        &self,
        destination: &str,
    ) -> Result<mpsc::UnboundedReceiver<serde_json::Value>, BusError> {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        let channel = channels
            .entry(destination.to_string())
            .or_insert_with(Channel::new);

        channel
            .receiver
            .take()
            .ok_or_else(|| BusError::AlreadySubscribed(destination.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_publish_then_subscribe_buffers_messages() {
        let bus = InMemoryBus::new();

        bus.publish("q", json!({"n": 1})).await.unwrap();
        bus.publish("q", json!({"n": 2})).await.unwrap();

        let mut rx = bus.subscribe("q").await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), json!({"n": 1}));
        assert_eq!(rx.recv().await.unwrap(), json!({"n": 2}));
    }

    #[tokio::test]
    async fn test_second_subscribe_rejected() {
        let bus = InMemoryBus::new();
        let _rx = bus.subscribe("q").await.unwrap();

        let result = bus.subscribe("q").await;
        assert!(matches!(result, Err(BusError::AlreadySubscribed(_))));
    }

    #[tokio::test]
    async fn test_bus_usable_after_poisoned_lock() {
        let bus = std::sync::Arc::new(InMemoryBus::new());

        let poisoner = bus.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.channels.lock().unwrap();
            panic!("poison the channel map");
        })
        .join();

        bus.publish("q", json!({"n": 1})).await.unwrap();
        let mut rx = bus.subscribe("q").await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), json!({"n": 1}));
    }

    #[tokio::test]
    async fn test_publish_after_subscriber_dropped_fails() {
        let bus = InMemoryBus::new();
        let rx = bus.subscribe("q").await.unwrap();
        drop(rx);

        let result = bus.publish("q", json!({})).await;
        assert!(matches!(result, Err(BusError::DeliveryFailure(_))));
    }
}

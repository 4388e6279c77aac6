//! Aggregate module
//!
//! Aggregate Root pattern implementation for Event Sourcing.

mod payment;

pub use payment::{Payment, PaymentStatus};

/// Aggregate trait that all aggregates must implement
pub trait Aggregate: Sized + Default {
    /// The type of events this aggregate handles
    type Event;

    /// Get the aggregate type name (for storage)
    fn aggregate_type() -> &'static str;

    /// Get the aggregate ID
    fn id(&self) -> uuid::Uuid;

    /// Get the current version (number of events applied)
    fn version(&self) -> i64;

    /// Apply an event to update the aggregate state
    fn apply(self, event: Self::Event) -> Self;

    /// Rebuild the aggregate by folding its full event history in order.
    /// Pure and deterministic: the same history always yields the same state.
    fn rehydrate<'a, I>(history: I) -> Self
    where
        I: IntoIterator<Item = &'a Self::Event>,
        Self::Event: Clone + 'a,
    {
        history
            .into_iter()
            .fold(Self::default(), |agg, ev| agg.apply(ev.clone()))
    }
}

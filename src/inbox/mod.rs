//! Inbox module
//!
//! Deduplicates inbound messages before they produce side effects.

mod repository;

pub use repository::{InboxError, InboxRecord, InboxRepository};

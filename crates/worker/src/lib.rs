//! Outbound delivery workers.
//!
//! One long-lived task per enabled entity relays its timeline events to
//! follower inboxes; a single association task relays likes and reactions.
//! Both reconcile against the store every ten seconds.

pub mod association;
pub mod message;

pub use association::AssociationWorker;
pub use message::MessageWorker;

/// Reconciliation interval for both workers.
pub(crate) const RECONCILE_INTERVAL_SECS: u64 = 10;

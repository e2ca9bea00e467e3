use std::pin::Pin;

use futures_core::Stream;

use crate::ChangeEvent;

/// A stream of change notifications for one table.
pub type ChangeStream = Pin<Box<dyn Stream<Item = ChangeEvent> + Send>>;

/// Trait for the backend's realtime change feed.
///
/// Subscriptions are per table and deliver inserts, updates, and deletes
/// as they are committed. Delivery starts at subscription time; there is
/// no replay of earlier changes.
pub trait ChangeFeed: Send + Sync {
    /// Subscribes to changes on `table`.
    fn subscribe(&self, table: &str) -> ChangeStream;
}

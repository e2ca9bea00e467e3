//! Drives list caches from the backend's change feed.

use std::collections::HashMap;

use backend::ChangeFeed;
use futures_util::StreamExt;

use crate::list::ListCache;

/// Applies change-feed events to the caches registered for their tables.
///
/// Bind one [`ListCache`] per table, then `run` against a feed: the
/// processor subscribes to every bound table, merges the streams, and
/// applies each event to the right cache. `run` returns when the feed
/// closes.
#[derive(Default)]
pub struct FeedProcessor {
    caches: HashMap<String, ListCache>,
}

impl FeedProcessor {
    /// Creates a processor with no bindings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a cache to a table's change stream.
    pub fn bind(&mut self, table: impl Into<String>, cache: ListCache) {
        self.caches.insert(table.into(), cache);
    }

    /// Returns the number of bound tables.
    pub fn binding_count(&self) -> usize {
        self.caches.len()
    }

    /// Subscribes to every bound table and returns the future that
    /// applies events until the feed closes.
    ///
    /// Subscriptions are taken synchronously, before the future is first
    /// polled, so events published right after this call are not missed.
    pub fn run<F: ChangeFeed>(self, feed: &F) -> impl std::future::Future<Output = ()> + Send + use<F> {
        let streams: Vec<_> = self
            .caches
            .keys()
            .map(|table| feed.subscribe(table))
            .collect();
        let caches = self.caches;

        async move {
            let mut merged = futures_util::stream::select_all(streams);

            while let Some(event) = merged.next().await {
                if let Some(cache) = caches.get(&event.table) {
                    cache.apply(&event).await;
                    metrics::counter!("cache_feed_events_applied").increment(1);
                    tracing::debug!(table = %event.table, kind = ?event.kind, "change applied");
                }
            }

            tracing::info!("change feed closed");
        }
    }
}

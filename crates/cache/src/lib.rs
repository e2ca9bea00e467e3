//! Client-side read state: entity list caches, change-feed merging, and
//! the persisted tenant session snapshot.
//!
//! The caches are not authoritative. A [`ListCache`] is fed from two
//! sources (locally originated optimistic merges after a successful
//! creation, and externally originated change-feed events) and its
//! merge rule is idempotent and last-write-wins, so the two sources can
//! arrive in either order and converge on the same state.

pub mod error;
pub mod feed;
pub mod list;
pub mod session;

pub use error::{CacheError, Result};
pub use feed::FeedProcessor;
pub use list::ListCache;
pub use session::{
    InMemorySnapshotStore, JsonFileSnapshotStore, SessionSnapshot, SnapshotStore, restore,
};

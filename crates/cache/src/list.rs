//! Keyed entity list cache.

use std::collections::HashMap;
use std::sync::Arc;

use backend::{ChangeEvent, ChangeKind, StoredRecord};
use common::RecordId;
use tokio::sync::RwLock;

/// An in-memory collection of rows keyed by id.
///
/// Merge semantics are replace-if-exists-else-append: applying the same
/// record twice leaves one entry, and whichever payload is applied last
/// wins. Both the optimistic local merge after a successful creation and
/// the change-feed handler write through this same rule, so their
/// relative order does not matter. Clones share state.
#[derive(Clone, Default)]
pub struct ListCache {
    entries: Arc<RwLock<HashMap<RecordId, StoredRecord>>>,
}

impl ListCache {
    /// Creates a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the entry for the record's id.
    pub async fn upsert(&self, record: StoredRecord) {
        self.entries.write().await.insert(record.id, record);
    }

    /// Removes the entry for `id`, if present.
    pub async fn remove(&self, id: RecordId) {
        self.entries.write().await.remove(&id);
    }

    /// Gets the entry for `id`.
    pub async fn get(&self, id: RecordId) -> Option<StoredRecord> {
        self.entries.read().await.get(&id).cloned()
    }

    /// All entries, oldest insertion first.
    pub async fn all(&self) -> Vec<StoredRecord> {
        let mut records: Vec<_> = self.entries.read().await.values().cloned().collect();
        records.sort_by(|a, b| {
            a.inserted_at
                .cmp(&b.inserted_at)
                .then_with(|| a.id.as_uuid().cmp(&b.id.as_uuid()))
        });
        records
    }

    /// Number of entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns true if the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Removes all entries.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Applies a change-feed event.
    pub async fn apply(&self, event: &ChangeEvent) {
        match event.kind {
            ChangeKind::Insert | ChangeKind::Update => {
                self.upsert(event.record.clone()).await;
            }
            ChangeKind::Delete => {
                self.remove(event.record.id).await;
            }
        }
    }
}

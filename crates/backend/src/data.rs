use async_trait::async_trait;
use common::RecordId;

use crate::{Result, StoredRecord};

/// Core trait for the backend's relational storage.
///
/// The store offers no multi-statement transactions to the client; every
/// method is an independent network round trip. All implementations must
/// be thread-safe (Send + Sync).
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Inserts a single row, returning it with its assigned id.
    async fn insert(&self, table: &str, row: serde_json::Value) -> Result<StoredRecord>;

    /// Inserts a batch of rows.
    ///
    /// All-or-nothing is NOT guaranteed: the backend applies rows one by
    /// one, and a failure part-way leaves the earlier rows in place.
    /// Callers that need atomicity must compensate by deleting whatever
    /// subset applied (see `delete_matching`).
    async fn insert_batch(
        &self,
        table: &str,
        rows: Vec<serde_json::Value>,
    ) -> Result<Vec<StoredRecord>>;

    /// Merges `patch`'s top-level fields into the row's payload.
    ///
    /// Fails with `RowNotFound` if the row does not exist.
    async fn update(
        &self,
        table: &str,
        id: RecordId,
        patch: serde_json::Value,
    ) -> Result<StoredRecord>;

    /// Deletes a row by id.
    ///
    /// Idempotent: deleting a non-existent id succeeds. Compensation logic
    /// relies on this.
    async fn delete(&self, table: &str, id: RecordId) -> Result<()>;

    /// Deletes every row whose payload field `field` equals `value`.
    ///
    /// Returns the number of rows removed. Used to roll back batch inserts
    /// by foreign key when individual row ids are unknown.
    async fn delete_matching(
        &self,
        table: &str,
        field: &str,
        value: &serde_json::Value,
    ) -> Result<u64>;

    /// Fetches a row by id, or None if it does not exist.
    async fn fetch(&self, table: &str, id: RecordId) -> Result<Option<StoredRecord>>;

    /// Fetches every row whose payload field `field` equals `value`.
    async fn fetch_matching(
        &self,
        table: &str,
        field: &str,
        value: &serde_json::Value,
    ) -> Result<Vec<StoredRecord>>;

    /// Fetches all rows in a table, in insertion order.
    async fn fetch_all(&self, table: &str) -> Result<Vec<StoredRecord>>;
}

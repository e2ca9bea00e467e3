use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use common::RecordId;
use futures_util::StreamExt;
use tokio::sync::{RwLock, broadcast};

use crate::{
    BackendError, ChangeEvent, ChangeFeed, ChangeKind, ChangeStream, DataStore, ObjectStore,
    Result, StoredRecord,
};

const CHANGE_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    content_type: String,
}

#[derive(Debug, Default)]
struct Faults {
    fail_insert: HashSet<String>,
    fail_update: HashSet<String>,
    fail_delete: HashSet<String>,
    fail_upload: bool,
    // One-shot: the next batch insert on the table applies this many rows,
    // then fails, leaving the applied subset behind.
    fail_batch_after: HashMap<String, usize>,
}

/// In-memory backend implementation for tests and local runs.
///
/// Implements all three capability traits and simulates the remote
/// backend's failure modes through injectable faults: rejected writes,
/// partially applied batch inserts, and failing uploads. Clones share
/// state.
#[derive(Clone)]
pub struct InMemoryBackend {
    tables: Arc<RwLock<HashMap<String, Vec<StoredRecord>>>>,
    objects: Arc<RwLock<HashMap<(String, String), StoredObject>>>,
    faults: Arc<std::sync::RwLock<Faults>>,
    write_calls: Arc<AtomicU64>,
    changes: broadcast::Sender<ChangeEvent>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            tables: Arc::new(RwLock::new(HashMap::new())),
            objects: Arc::new(RwLock::new(HashMap::new())),
            faults: Arc::new(std::sync::RwLock::new(Faults::default())),
            write_calls: Arc::new(AtomicU64::new(0)),
            changes,
        }
    }

    /// Configures inserts into `table` (single and batch) to fail.
    pub fn set_fail_on_insert(&self, table: &str, fail: bool) {
        let mut faults = self.faults.write().unwrap();
        if fail {
            faults.fail_insert.insert(table.to_string());
        } else {
            faults.fail_insert.remove(table);
        }
    }

    /// Configures updates to `table` to fail.
    pub fn set_fail_on_update(&self, table: &str, fail: bool) {
        let mut faults = self.faults.write().unwrap();
        if fail {
            faults.fail_update.insert(table.to_string());
        } else {
            faults.fail_update.remove(table);
        }
    }

    /// Configures deletes on `table` to fail.
    pub fn set_fail_on_delete(&self, table: &str, fail: bool) {
        let mut faults = self.faults.write().unwrap();
        if fail {
            faults.fail_delete.insert(table.to_string());
        } else {
            faults.fail_delete.remove(table);
        }
    }

    /// Configures the next upload to fail.
    pub fn set_fail_on_upload(&self, fail: bool) {
        self.faults.write().unwrap().fail_upload = fail;
    }

    /// Makes the next batch insert into `table` apply only the first
    /// `applied` rows before failing.
    pub fn set_batch_failure_after(&self, table: &str, applied: usize) {
        self.faults
            .write()
            .unwrap()
            .fail_batch_after
            .insert(table.to_string(), applied);
    }

    /// Returns the number of rows currently in `table`.
    pub async fn row_count(&self, table: &str) -> usize {
        self.tables
            .read()
            .await
            .get(table)
            .map(|rows| rows.len())
            .unwrap_or(0)
    }

    /// Returns the number of stored objects across all buckets.
    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }

    /// Returns true if an object exists at `bucket/path`.
    pub async fn has_object(&self, bucket: &str, path: &str) -> bool {
        self.objects
            .read()
            .await
            .contains_key(&(bucket.to_string(), path.to_string()))
    }

    /// Returns the stored content type of an object, if it exists.
    pub async fn object_content_type(&self, bucket: &str, path: &str) -> Option<String> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), path.to_string()))
            .map(|o| o.content_type.clone())
    }

    /// Returns the stored size of an object in bytes, if it exists.
    pub async fn object_size(&self, bucket: &str, path: &str) -> Option<usize> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), path.to_string()))
            .map(|o| o.bytes.len())
    }

    /// Total write calls issued so far (inserts, updates, deletes, uploads).
    pub fn write_call_count(&self) -> u64 {
        self.write_calls.load(Ordering::SeqCst)
    }

    /// Clears all rows and objects. Faults and counters are kept.
    pub async fn clear(&self) {
        self.tables.write().await.clear();
        self.objects.write().await.clear();
    }

    fn record_write(&self) {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        metrics::counter!("backend_write_calls").increment(1);
    }

    fn publish(&self, table: &str, kind: ChangeKind, record: StoredRecord) {
        // Nobody listening is fine.
        let _ = self.changes.send(ChangeEvent {
            table: table.to_string(),
            kind,
            record,
        });
    }

    fn rejected(target: &str, reason: &str) -> BackendError {
        BackendError::Rejected {
            target: target.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl DataStore for InMemoryBackend {
    async fn insert(&self, table: &str, row: serde_json::Value) -> Result<StoredRecord> {
        self.record_write();

        if self.faults.read().unwrap().fail_insert.contains(table) {
            return Err(Self::rejected(table, "service unavailable"));
        }

        let now = Utc::now();
        let record = StoredRecord {
            id: RecordId::new(),
            payload: row,
            inserted_at: now,
            updated_at: now,
        };

        self.tables
            .write()
            .await
            .entry(table.to_string())
            .or_default()
            .push(record.clone());

        self.publish(table, ChangeKind::Insert, record.clone());
        Ok(record)
    }

    async fn insert_batch(
        &self,
        table: &str,
        rows: Vec<serde_json::Value>,
    ) -> Result<Vec<StoredRecord>> {
        self.record_write();

        let apply_before_failing = {
            let mut faults = self.faults.write().unwrap();
            if faults.fail_insert.contains(table) {
                return Err(Self::rejected(table, "service unavailable"));
            }
            faults.fail_batch_after.remove(table)
        };

        let now = Utc::now();
        let mut stored = Vec::with_capacity(rows.len());
        let mut aborted = false;

        {
            let mut tables = self.tables.write().await;
            let entry = tables.entry(table.to_string()).or_default();

            for (index, row) in rows.into_iter().enumerate() {
                if let Some(limit) = apply_before_failing
                    && index >= limit
                {
                    // Earlier rows stay applied; the batch as a whole failed.
                    aborted = true;
                    break;
                }

                let record = StoredRecord {
                    id: RecordId::new(),
                    payload: row,
                    inserted_at: now,
                    updated_at: now,
                };
                entry.push(record.clone());
                stored.push(record);
            }
        }

        for record in &stored {
            self.publish(table, ChangeKind::Insert, record.clone());
        }

        if aborted {
            let limit = apply_before_failing.unwrap_or(0);
            return Err(Self::rejected(
                table,
                &format!("batch aborted after {limit} rows"),
            ));
        }
        Ok(stored)
    }

    async fn update(
        &self,
        table: &str,
        id: RecordId,
        patch: serde_json::Value,
    ) -> Result<StoredRecord> {
        self.record_write();

        if self.faults.read().unwrap().fail_update.contains(table) {
            return Err(Self::rejected(table, "service unavailable"));
        }

        let Some(fields) = patch.as_object().cloned() else {
            return Err(Self::rejected(table, "patch must be a JSON object"));
        };

        let mut tables = self.tables.write().await;
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| BackendError::RowNotFound {
                table: table.to_string(),
                id,
            })?;

        let record = rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| BackendError::RowNotFound {
                table: table.to_string(),
                id,
            })?;

        if let Some(payload) = record.payload.as_object_mut() {
            for (key, value) in fields {
                payload.insert(key, value);
            }
        }
        record.updated_at = Utc::now();
        let updated = record.clone();
        drop(tables);

        self.publish(table, ChangeKind::Update, updated.clone());
        Ok(updated)
    }

    async fn delete(&self, table: &str, id: RecordId) -> Result<()> {
        self.record_write();

        if self.faults.read().unwrap().fail_delete.contains(table) {
            return Err(Self::rejected(table, "service unavailable"));
        }

        let removed = {
            let mut tables = self.tables.write().await;
            match tables.get_mut(table) {
                Some(rows) => {
                    let mut removed_row = None;
                    rows.retain(|r| {
                        if r.id == id {
                            removed_row = Some(r.clone());
                            false
                        } else {
                            true
                        }
                    });
                    removed_row
                }
                None => None,
            }
        };

        // Deleting a missing row is not an error.
        if let Some(record) = removed {
            self.publish(table, ChangeKind::Delete, record);
        }
        Ok(())
    }

    async fn delete_matching(
        &self,
        table: &str,
        field: &str,
        value: &serde_json::Value,
    ) -> Result<u64> {
        self.record_write();

        if self.faults.read().unwrap().fail_delete.contains(table) {
            return Err(Self::rejected(table, "service unavailable"));
        }

        let removed = {
            let mut tables = self.tables.write().await;
            match tables.get_mut(table) {
                Some(rows) => {
                    let mut removed = Vec::new();
                    rows.retain(|r| {
                        if r.field(field) == Some(value) {
                            removed.push(r.clone());
                            false
                        } else {
                            true
                        }
                    });
                    removed
                }
                None => Vec::new(),
            }
        };

        let count = removed.len() as u64;
        for record in removed {
            self.publish(table, ChangeKind::Delete, record);
        }
        Ok(count)
    }

    async fn fetch(&self, table: &str, id: RecordId) -> Result<Option<StoredRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(table)
            .and_then(|rows| rows.iter().find(|r| r.id == id).cloned()))
    }

    async fn fetch_matching(
        &self,
        table: &str,
        field: &str,
        value: &serde_json::Value,
    ) -> Result<Vec<StoredRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|r| r.field(field) == Some(value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn fetch_all(&self, table: &str) -> Result<Vec<StoredRecord>> {
        let tables = self.tables.read().await;
        Ok(tables.get(table).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl ObjectStore for InMemoryBackend {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        self.record_write();

        if self.faults.read().unwrap().fail_upload {
            return Err(Self::rejected(bucket, "storage unavailable"));
        }

        let key = (bucket.to_string(), path.to_string());
        let mut objects = self.objects.write().await;
        if objects.contains_key(&key) {
            return Err(BackendError::ObjectExists {
                bucket: bucket.to_string(),
                path: path.to_string(),
            });
        }

        objects.insert(
            key,
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn remove(&self, bucket: &str, path: &str) -> Result<()> {
        self.objects
            .write()
            .await
            .remove(&(bucket.to_string(), path.to_string()));
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("https://objects.local/{bucket}/{path}")
    }

    async fn signed_url(&self, bucket: &str, path: &str, ttl_seconds: u64) -> Result<String> {
        Ok(format!(
            "{}?expires_in={ttl_seconds}",
            self.public_url(bucket, path)
        ))
    }
}

impl ChangeFeed for InMemoryBackend {
    fn subscribe(&self, table: &str) -> ChangeStream {
        let rx = self.changes.subscribe();
        let table = table.to_string();

        let stream = futures_util::stream::unfold(rx, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(event) => return Some((event, rx)),
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        })
        .filter(move |event| futures_util::future::ready(event.table == table));

        Box::pin(stream)
    }
}

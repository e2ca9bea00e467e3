//! Route handlers.

pub mod health;
pub mod metrics;
pub mod products;
pub mod services;
pub mod stores;
pub mod teams;

use backend::{DataStore, StoredRecord};
use cache::ListCache;
use common::RecordId;
use serde::Deserialize;

use crate::error::ApiError;

/// A file sent inline with a creation request.
#[derive(Deserialize)]
pub struct FileUploadRequest {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl From<FileUploadRequest> for domain::FileUpload {
    fn from(req: FileUploadRequest) -> Self {
        domain::FileUpload::new(req.file_name, req.content_type, req.bytes)
    }
}

pub(crate) fn parse_record_id(id: &str) -> Result<RecordId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))?;
    Ok(RecordId::from(uuid))
}

/// Builds the row a successful creation merges into its list cache.
/// The change feed will deliver the authoritative row shortly after and
/// replace this one; the merge rule makes that idempotent.
pub(crate) fn optimistic_record<T: serde::Serialize>(id: RecordId, value: &T) -> Option<StoredRecord> {
    let payload = serde_json::to_value(value).ok()?;
    let now = chrono::Utc::now();
    Some(StoredRecord {
        id,
        payload,
        inserted_at: now,
        updated_at: now,
    })
}

/// Refreshes a list cache from the authoritative store before serving it.
pub(crate) async fn refresh_list<D: DataStore>(
    data: &D,
    table: &str,
    cache: &ListCache,
) -> Result<(), ApiError> {
    let records = data
        .fetch_all(table)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    for record in records {
        cache.upsert(record).await;
    }
    Ok(())
}

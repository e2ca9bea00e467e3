use chrono::{DateTime, Utc};
use common::RecordId;
use serde::{Deserialize, Serialize};

/// A row as stored by the backend.
///
/// The backend is schemaless from the client's point of view: each row is
/// an id plus a JSON payload. Typed entity structs are serialized into and
/// parsed out of `payload` by the domain layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Identifier assigned by the store on insert.
    pub id: RecordId,

    /// The row contents as JSON.
    pub payload: serde_json::Value,

    /// When the row was first inserted.
    pub inserted_at: DateTime<Utc>,

    /// When the row was last patched.
    pub updated_at: DateTime<Utc>,
}

impl StoredRecord {
    /// Returns a payload field, if present.
    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.payload.get(name)
    }

    /// Returns a payload field as a string slice, if present and a string.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.payload.get(name).and_then(|v| v.as_str())
    }
}

/// The kind of mutation a change notification describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A push notification from the backend's change feed.
///
/// For `Delete`, `record` carries the last known state of the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// The table the change happened in.
    pub table: String,

    /// What kind of mutation occurred.
    pub kind: ChangeKind,

    /// The affected row.
    pub record: StoredRecord,
}

//! Team drafts and records.
//!
//! A team is the tenant everything else is scoped under. Creating one
//! also enrolls the creator as an admin member and registers the service
//! types the team offers.

use backend::StoredRecord;
use common::RecordId;
use serde::{Deserialize, Serialize};

use crate::file::FileUpload;
use crate::validation::{DraftError, require_min_len, require_unique_keys};

/// Role given to the creator's membership row.
pub const ROLE_ADMIN: &str = "admin";

/// Form input for creating a team.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamDraft {
    pub name: String,
    pub document: String,
    pub location: String,
    /// Names of the service types the team offers, e.g. `"Repair"`.
    pub service_types: Vec<String>,
    pub logo: Option<FileUpload>,
}

impl TeamDraft {
    /// Validates every field. Runs before any write.
    pub fn validate(&self) -> Result<(), DraftError> {
        require_min_len("name", &self.name, 3)?;
        require_min_len("document", &self.document, 5)?;
        require_min_len("location", &self.location, 3)?;
        require_unique_keys(self.service_types.iter().map(String::as_str))?;
        if let Some(logo) = &self.logo {
            logo.validate()?;
        }
        Ok(())
    }

    /// The parent row to insert into `teams`.
    pub fn parent_row(&self, owner_id: RecordId) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "document": self.document,
            "location": self.location,
            "owner_id": owner_id,
            "logo": null,
        })
    }

    /// The creator's membership row, minus the team foreign key.
    pub fn member_row(&self, owner_id: RecordId) -> serde_json::Value {
        serde_json::json!({
            "user_id": owner_id,
            "role": ROLE_ADMIN,
        })
    }

    /// One row per offered service type, minus the team foreign key.
    pub fn service_type_rows(&self) -> Vec<serde_json::Value> {
        self.service_types
            .iter()
            .map(|name| serde_json::json!({ "name": name }))
            .collect()
    }
}

#[derive(Deserialize)]
struct TeamFields {
    name: String,
    document: String,
    location: String,
    owner_id: RecordId,
    logo: Option<String>,
}

/// A team row as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub id: RecordId,
    pub name: String,
    pub document: String,
    pub location: String,
    pub owner_id: RecordId,
    pub logo: Option<String>,
}

impl TeamRecord {
    /// Parses a stored row into a typed record.
    pub fn from_stored(record: &StoredRecord) -> Result<Self, serde_json::Error> {
        let fields: TeamFields = serde_json::from_value(record.payload.clone())?;
        Ok(Self {
            id: record.id,
            name: fields.name,
            document: fields.document,
            location: fields.location,
            owner_id: fields.owner_id,
            logo: fields.logo,
        })
    }
}

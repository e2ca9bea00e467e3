//! Store drafts and records.

use backend::StoredRecord;
use common::RecordId;
use serde::{Deserialize, Serialize};

use crate::file::FileUpload;
use crate::validation::{DraftError, require_min_len, require_unique_keys};

/// A contact channel for a store (label plus destination, e.g.
/// `("phone", "+55 ...")`).
#[derive(Debug, Clone, PartialEq)]
pub struct ContactDraft {
    pub label: String,
    pub value: String,
}

/// Physical address of a store.
#[derive(Debug, Clone, PartialEq)]
pub struct AddressDraft {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

/// Form input for creating a store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreDraft {
    pub name: String,
    pub description: String,
    pub contacts: Vec<ContactDraft>,
    pub address: AddressDraft,
    pub image: Option<FileUpload>,
}

impl StoreDraft {
    /// Validates every field. Runs before any write.
    pub fn validate(&self) -> Result<(), DraftError> {
        require_min_len("name", &self.name, 3)?;
        require_min_len("description", &self.description, 5)?;
        require_unique_keys(self.contacts.iter().map(|c| c.label.as_str()))?;
        for contact in &self.contacts {
            require_min_len("contact.value", &contact.value, 3)?;
        }
        require_min_len("address.street", &self.address.street, 5)?;
        require_min_len("address.city", &self.address.city, 3)?;
        require_min_len("address.state", &self.address.state, 2)?;
        require_min_len("address.postal_code", &self.address.postal_code, 4)?;
        if let Some(image) = &self.image {
            image.validate()?;
        }
        Ok(())
    }

    /// The parent row to insert into `stores`.
    pub fn parent_row(&self, team_id: RecordId) -> serde_json::Value {
        serde_json::json!({
            "team_id": team_id,
            "name": self.name,
            "description": self.description,
            "image": null,
        })
    }

    /// One row per contact channel, minus the store foreign key.
    pub fn contact_rows(&self) -> Vec<serde_json::Value> {
        self.contacts
            .iter()
            .map(|c| serde_json::json!({ "label": c.label, "value": c.value }))
            .collect()
    }

    /// The address row, minus the store foreign key.
    pub fn address_row(&self) -> serde_json::Value {
        serde_json::json!({
            "street": self.address.street,
            "city": self.address.city,
            "state": self.address.state,
            "postal_code": self.address.postal_code,
        })
    }
}

#[derive(Deserialize)]
struct StoreFields {
    team_id: RecordId,
    name: String,
    description: String,
    image: Option<String>,
}

/// A store row as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreRecord {
    pub id: RecordId,
    pub team_id: RecordId,
    pub name: String,
    pub description: String,
    pub image: Option<String>,
}

impl StoreRecord {
    /// Parses a stored row into a typed record.
    pub fn from_stored(record: &StoredRecord) -> Result<Self, serde_json::Error> {
        let fields: StoreFields = serde_json::from_value(record.payload.clone())?;
        Ok(Self {
            id: record.id,
            team_id: fields.team_id,
            name: fields.name,
            description: fields.description,
            image: fields.image,
        })
    }
}

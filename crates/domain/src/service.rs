//! Service drafts and records.
//!
//! A service is a job booked for a client, scoped to a team and tagged
//! with one of the team's registered service types.

use backend::StoredRecord;
use common::RecordId;
use serde::{Deserialize, Serialize};

use crate::file::FileUpload;
use crate::validation::{DraftError, require_email, require_known_id, require_min_len};

/// Client contact captured alongside a new service.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientDraft {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Form input for creating a service.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDraft {
    pub name: String,
    pub description: String,
    /// Must be one of the team's registered service type ids.
    pub service_type_id: RecordId,
    pub client: ClientDraft,
    pub attachment: Option<FileUpload>,
}

impl ServiceDraft {
    /// Validates every field against the team's known service types.
    /// Runs before any write.
    pub fn validate(&self, known_type_ids: &[RecordId]) -> Result<(), DraftError> {
        require_min_len("name", &self.name, 3)?;
        require_min_len("description", &self.description, 5)?;
        require_known_id("service_type_id", self.service_type_id, known_type_ids)?;
        require_min_len("client.name", &self.client.name, 3)?;
        require_email("client.email", &self.client.email)?;
        require_min_len("client.phone", &self.client.phone, 5)?;
        if let Some(attachment) = &self.attachment {
            attachment.validate()?;
        }
        Ok(())
    }

    /// The parent row to insert into `services`.
    pub fn parent_row(&self, team_id: RecordId) -> serde_json::Value {
        serde_json::json!({
            "team_id": team_id,
            "name": self.name,
            "description": self.description,
            "service_type_id": self.service_type_id,
            "attachment": null,
        })
    }

    /// The client contact row, minus the service foreign key.
    pub fn client_row(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.client.name,
            "email": self.client.email,
            "phone": self.client.phone,
        })
    }
}

#[derive(Deserialize)]
struct ServiceFields {
    team_id: RecordId,
    name: String,
    description: String,
    service_type_id: RecordId,
    attachment: Option<String>,
}

/// A service row as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub id: RecordId,
    pub team_id: RecordId,
    pub name: String,
    pub description: String,
    pub service_type_id: RecordId,
    pub attachment: Option<String>,
}

impl ServiceRecord {
    /// Parses a stored row into a typed record.
    pub fn from_stored(record: &StoredRecord) -> Result<Self, serde_json::Error> {
        let fields: ServiceFields = serde_json::from_value(record.payload.clone())?;
        Ok(Self {
            id: record.id,
            team_id: fields.team_id,
            name: fields.name,
            description: fields.description,
            service_type_id: fields.service_type_id,
            attachment: fields.attachment,
        })
    }
}

//! Service creation flow.
//!
//! Inserts the service row, captures the client contact, and optionally
//! uploads an attachment (work order PDF, photos) patched back onto the
//! service row.

use backend::{DataStore, ObjectStore};
use common::RecordId;
use domain::{ServiceDraft, ServiceRecord, tables};

use crate::context::FlowContext;
use crate::coordinator::Transaction;
use crate::error::{FlowError, Result};
use crate::steps::{InsertDependents, InsertParent, PatchAssetRef, UploadAsset};

/// Transaction name for service creation.
pub const TRANSACTION: &str = "create_service";

/// Step name: insert the service row.
pub const STEP_INSERT_SERVICE: &str = "insert_service";

/// Step name: insert the client contact row.
pub const STEP_INSERT_CLIENT: &str = "insert_client";

/// Step name: upload the attachment.
pub const STEP_UPLOAD_ATTACHMENT: &str = "upload_attachment";

/// Step name: patch the service row with the attachment URL.
pub const STEP_PATCH_ATTACHMENT: &str = "patch_attachment_url";

/// Creates services with all-or-nothing visibility.
pub struct ServiceFlow<D, O>
where
    D: DataStore + Clone + 'static,
    O: ObjectStore + Clone + 'static,
{
    data: D,
    objects: O,
}

impl<D, O> ServiceFlow<D, O>
where
    D: DataStore + Clone + 'static,
    O: ObjectStore + Clone + 'static,
{
    /// Creates a new service flow.
    pub fn new(data: D, objects: O) -> Self {
        Self { data, objects }
    }

    /// Creates a service scoped to `team_id`.
    ///
    /// The draft's service type must be one of the team's registered
    /// types; the reference list is fetched before validation so an
    /// unknown id is rejected without any write.
    #[tracing::instrument(skip(self, draft), fields(service = %draft.name))]
    pub async fn create(&self, team_id: RecordId, draft: ServiceDraft) -> Result<ServiceRecord> {
        let known_types = self
            .data
            .fetch_matching(
                tables::TEAM_SERVICE_TYPES,
                tables::TEAM_ID,
                &serde_json::json!(team_id),
            )
            .await?;
        let known_type_ids: Vec<RecordId> = known_types.iter().map(|r| r.id).collect();

        draft.validate(&known_type_ids)?;

        let mut transaction = Transaction::new(TRANSACTION)
            .step(InsertParent::new(
                STEP_INSERT_SERVICE,
                self.data.clone(),
                tables::SERVICES,
                draft.parent_row(team_id),
            ))
            .step(InsertDependents::new(
                STEP_INSERT_CLIENT,
                self.data.clone(),
                tables::SERVICE_CLIENTS,
                tables::SERVICE_ID,
                vec![draft.client_row()],
            ));

        if let Some(attachment) = draft.attachment.clone() {
            transaction = transaction
                .step(UploadAsset::new(
                    STEP_UPLOAD_ATTACHMENT,
                    self.objects.clone(),
                    tables::buckets::SERVICE_ATTACHMENTS,
                    attachment,
                ))
                .step(PatchAssetRef::new(
                    STEP_PATCH_ATTACHMENT,
                    self.data.clone(),
                    "attachment",
                ));
        }

        let mut ctx = FlowContext::new();
        let report = transaction.execute(&mut ctx).await;
        if let Some(error) = report.into_error() {
            return Err(error);
        }

        let parent = ctx
            .parent()
            .ok_or(FlowError::MissingResult("service record"))?;
        Ok(ServiceRecord::from_stored(parent)?)
    }
}

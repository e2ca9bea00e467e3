//! Team creation flow.
//!
//! Inserts the team row, enrolls the creator as an admin member,
//! registers the offered service types, and, when a logo was attached,
//! uploads it and patches the team row with its URL.

use backend::{DataStore, ObjectStore};
use common::RecordId;
use domain::{TeamDraft, TeamRecord, tables};

use crate::context::FlowContext;
use crate::coordinator::Transaction;
use crate::error::{FlowError, Result};
use crate::steps::{InsertDependents, InsertParent, PatchAssetRef, UploadAsset};

/// Transaction name for team creation.
pub const TRANSACTION: &str = "create_team";

/// Step name: insert the team row.
pub const STEP_INSERT_TEAM: &str = "insert_team";

/// Step name: insert the creator's membership row.
pub const STEP_INSERT_MEMBERS: &str = "insert_members";

/// Step name: insert the offered service type rows.
pub const STEP_INSERT_SERVICE_TYPES: &str = "insert_service_types";

/// Step name: upload the logo.
pub const STEP_UPLOAD_LOGO: &str = "upload_logo";

/// Step name: patch the team row with the logo URL.
pub const STEP_PATCH_LOGO: &str = "patch_logo_url";

/// Creates teams with all-or-nothing visibility.
pub struct TeamFlow<D, O>
where
    D: DataStore + Clone + 'static,
    O: ObjectStore + Clone + 'static,
{
    data: D,
    objects: O,
}

impl<D, O> TeamFlow<D, O>
where
    D: DataStore + Clone + 'static,
    O: ObjectStore + Clone + 'static,
{
    /// Creates a new team flow.
    pub fn new(data: D, objects: O) -> Self {
        Self { data, objects }
    }

    /// Creates a team owned by `owner_id`.
    ///
    /// Validates the draft fully before the first write; on any step
    /// failure, prior writes are compensated and a single error naming
    /// the failed step is returned.
    #[tracing::instrument(skip(self, draft), fields(team = %draft.name))]
    pub async fn create(&self, owner_id: RecordId, draft: TeamDraft) -> Result<TeamRecord> {
        draft.validate()?;

        let mut transaction = Transaction::new(TRANSACTION)
            .step(InsertParent::new(
                STEP_INSERT_TEAM,
                self.data.clone(),
                tables::TEAMS,
                draft.parent_row(owner_id),
            ))
            .step(InsertDependents::new(
                STEP_INSERT_MEMBERS,
                self.data.clone(),
                tables::TEAM_MEMBERS,
                tables::TEAM_ID,
                vec![draft.member_row(owner_id)],
            ))
            .step(InsertDependents::new(
                STEP_INSERT_SERVICE_TYPES,
                self.data.clone(),
                tables::TEAM_SERVICE_TYPES,
                tables::TEAM_ID,
                draft.service_type_rows(),
            ));

        if let Some(logo) = draft.logo.clone() {
            transaction = transaction
                .step(UploadAsset::new(
                    STEP_UPLOAD_LOGO,
                    self.objects.clone(),
                    tables::buckets::TEAM_LOGOS,
                    logo,
                ))
                .step(PatchAssetRef::new(
                    STEP_PATCH_LOGO,
                    self.data.clone(),
                    "logo",
                ));
        }

        let mut ctx = FlowContext::new();
        let report = transaction.execute(&mut ctx).await;
        if let Some(error) = report.into_error() {
            return Err(error);
        }

        let parent = ctx
            .parent()
            .ok_or(FlowError::MissingResult("team record"))?;
        Ok(TeamRecord::from_stored(parent)?)
    }
}

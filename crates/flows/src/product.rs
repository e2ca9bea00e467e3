//! Product creation flow.
//!
//! Inserts the product row under one of the team's stores, its custom
//! identifier rows (barcode, SKU, ...), and optionally uploads a media
//! file patched back onto the row.

use backend::{DataStore, ObjectStore};
use common::RecordId;
use domain::{DraftError, ProductDraft, ProductRecord, tables};

use crate::context::FlowContext;
use crate::coordinator::Transaction;
use crate::error::{FlowError, Result};
use crate::steps::{InsertDependents, InsertParent, PatchAssetRef, UploadAsset};

/// Transaction name for product creation.
pub const TRANSACTION: &str = "create_product";

/// Step name: insert the product row.
pub const STEP_INSERT_PRODUCT: &str = "insert_product";

/// Step name: insert the identifier rows.
pub const STEP_INSERT_IDENTIFIERS: &str = "insert_identifiers";

/// Step name: upload the media file.
pub const STEP_UPLOAD_MEDIA: &str = "upload_media";

/// Step name: patch the product row with the media URL.
pub const STEP_PATCH_MEDIA: &str = "patch_media_url";

/// Creates products with all-or-nothing visibility.
pub struct ProductFlow<D, O>
where
    D: DataStore + Clone + 'static,
    O: ObjectStore + Clone + 'static,
{
    data: D,
    objects: O,
}

impl<D, O> ProductFlow<D, O>
where
    D: DataStore + Clone + 'static,
    O: ObjectStore + Clone + 'static,
{
    /// Creates a new product flow.
    pub fn new(data: D, objects: O) -> Self {
        Self { data, objects }
    }

    /// Creates a product scoped to `team_id`.
    ///
    /// The draft's store must be one of the team's stores; the reference
    /// list is fetched before validation so an unknown id is rejected
    /// without any write. Colliding uniqueness constraints (e.g. a
    /// duplicate barcode) surface as an ordinary step failure rejected by
    /// the backend.
    #[tracing::instrument(skip(self, draft), fields(product = %draft.name))]
    pub async fn create(&self, team_id: RecordId, draft: ProductDraft) -> Result<ProductRecord> {
        let known_stores = self
            .data
            .fetch_matching(tables::STORES, tables::TEAM_ID, &serde_json::json!(team_id))
            .await?;
        let known_store_ids: Vec<RecordId> = known_stores.iter().map(|r| r.id).collect();

        draft.validate(&known_store_ids)?;
        let parent_row = draft.parent_row(team_id).map_err(DraftError::from)?;

        let mut transaction = Transaction::new(TRANSACTION)
            .step(InsertParent::new(
                STEP_INSERT_PRODUCT,
                self.data.clone(),
                tables::PRODUCTS,
                parent_row,
            ))
            .step(InsertDependents::new(
                STEP_INSERT_IDENTIFIERS,
                self.data.clone(),
                tables::PRODUCT_IDENTIFIERS,
                tables::PRODUCT_ID,
                draft.identifier_rows(),
            ));

        if let Some(media) = draft.media.clone() {
            transaction = transaction
                .step(UploadAsset::new(
                    STEP_UPLOAD_MEDIA,
                    self.objects.clone(),
                    tables::buckets::PRODUCT_MEDIA,
                    media,
                ))
                .step(PatchAssetRef::new(
                    STEP_PATCH_MEDIA,
                    self.data.clone(),
                    "media",
                ));
        }

        let mut ctx = FlowContext::new();
        let report = transaction.execute(&mut ctx).await;
        if let Some(error) = report.into_error() {
            return Err(error);
        }

        let parent = ctx
            .parent()
            .ok_or(FlowError::MissingResult("product record"))?;
        Ok(ProductRecord::from_stored(parent)?)
    }
}

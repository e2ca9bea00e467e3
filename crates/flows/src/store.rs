//! Store creation flow.
//!
//! Inserts the store row, its contact channels and address, and
//! optionally uploads a storefront image patched back onto the row.

use backend::{DataStore, ObjectStore};
use common::RecordId;
use domain::{StoreDraft, StoreRecord, tables};

use crate::context::FlowContext;
use crate::coordinator::Transaction;
use crate::error::{FlowError, Result};
use crate::steps::{InsertDependents, InsertParent, PatchAssetRef, UploadAsset};

/// Transaction name for store creation.
pub const TRANSACTION: &str = "create_store";

/// Step name: insert the store row.
pub const STEP_INSERT_STORE: &str = "insert_store";

/// Step name: insert the contact rows.
pub const STEP_INSERT_CONTACTS: &str = "insert_contacts";

/// Step name: insert the address row.
pub const STEP_INSERT_ADDRESS: &str = "insert_address";

/// Step name: upload the storefront image.
pub const STEP_UPLOAD_IMAGE: &str = "upload_image";

/// Step name: patch the store row with the image URL.
pub const STEP_PATCH_IMAGE: &str = "patch_image_url";

/// Creates stores with all-or-nothing visibility.
pub struct StoreFlow<D, O>
where
    D: DataStore + Clone + 'static,
    O: ObjectStore + Clone + 'static,
{
    data: D,
    objects: O,
}

impl<D, O> StoreFlow<D, O>
where
    D: DataStore + Clone + 'static,
    O: ObjectStore + Clone + 'static,
{
    /// Creates a new store flow.
    pub fn new(data: D, objects: O) -> Self {
        Self { data, objects }
    }

    /// Creates a store scoped to `team_id`.
    #[tracing::instrument(skip(self, draft), fields(store = %draft.name))]
    pub async fn create(&self, team_id: RecordId, draft: StoreDraft) -> Result<StoreRecord> {
        draft.validate()?;

        let mut transaction = Transaction::new(TRANSACTION)
            .step(InsertParent::new(
                STEP_INSERT_STORE,
                self.data.clone(),
                tables::STORES,
                draft.parent_row(team_id),
            ))
            .step(InsertDependents::new(
                STEP_INSERT_CONTACTS,
                self.data.clone(),
                tables::STORE_CONTACTS,
                tables::STORE_ID,
                draft.contact_rows(),
            ))
            .step(InsertDependents::new(
                STEP_INSERT_ADDRESS,
                self.data.clone(),
                tables::STORE_ADDRESSES,
                tables::STORE_ID,
                vec![draft.address_row()],
            ));

        if let Some(image) = draft.image.clone() {
            transaction = transaction
                .step(UploadAsset::new(
                    STEP_UPLOAD_IMAGE,
                    self.objects.clone(),
                    tables::buckets::STORE_IMAGES,
                    image,
                ))
                .step(PatchAssetRef::new(
                    STEP_PATCH_IMAGE,
                    self.data.clone(),
                    "image",
                ));
        }

        let mut ctx = FlowContext::new();
        let report = transaction.execute(&mut ctx).await;
        if let Some(error) = report.into_error() {
            return Err(error);
        }

        let parent = ctx
            .parent()
            .ok_or(FlowError::MissingResult("store record"))?;
        Ok(StoreRecord::from_stored(parent)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend::InMemoryBackend;
    use domain::{AddressDraft, ContactDraft, FileUpload};

    fn flow(backend: &InMemoryBackend) -> StoreFlow<InMemoryBackend, InMemoryBackend> {
        StoreFlow::new(backend.clone(), backend.clone())
    }

    fn draft() -> StoreDraft {
        StoreDraft {
            name: "Downtown".to_string(),
            description: "Flagship storefront".to_string(),
            contacts: vec![ContactDraft {
                label: "phone".to_string(),
                value: "+55 11 5555-0000".to_string(),
            }],
            address: AddressDraft {
                street: "Av. Paulista, 1000".to_string(),
                city: "São Paulo".to_string(),
                state: "SP".to_string(),
                postal_code: "01310-100".to_string(),
            },
            image: None,
        }
    }

    #[tokio::test]
    async fn create_with_contacts_and_address() {
        let backend = InMemoryBackend::new();
        let team_id = RecordId::new();

        let store = flow(&backend).create(team_id, draft()).await.unwrap();

        assert_eq!(store.team_id, team_id);
        assert_eq!(backend.row_count(tables::STORES).await, 1);
        assert_eq!(backend.row_count(tables::STORE_CONTACTS).await, 1);
        assert_eq!(backend.row_count(tables::STORE_ADDRESSES).await, 1);

        let addresses = backend.fetch_all(tables::STORE_ADDRESSES).await.unwrap();
        assert_eq!(
            addresses[0].field("store_id"),
            Some(&serde_json::json!(store.id))
        );
    }

    #[tokio::test]
    async fn create_without_contacts_is_fine() {
        let backend = InMemoryBackend::new();
        let mut d = draft();
        d.contacts.clear();

        flow(&backend).create(RecordId::new(), d).await.unwrap();
        assert_eq!(backend.row_count(tables::STORE_CONTACTS).await, 0);
        assert_eq!(backend.row_count(tables::STORE_ADDRESSES).await, 1);
    }

    #[tokio::test]
    async fn create_with_image() {
        let backend = InMemoryBackend::new();
        let mut d = draft();
        d.image = Some(FileUpload::new("front.jpg", "image/jpeg", vec![1, 2]));

        let store = flow(&backend).create(RecordId::new(), d).await.unwrap();
        let url = store.image.expect("image url set");
        assert!(url.contains(&store.id.to_string()));
        assert!(url.ends_with(".jpg"));
    }

    #[tokio::test]
    async fn address_failure_rolls_back_store_and_contacts() {
        let backend = InMemoryBackend::new();
        backend.set_fail_on_insert(tables::STORE_ADDRESSES, true);

        let err = flow(&backend)
            .create(RecordId::new(), draft())
            .await
            .unwrap_err();

        match err {
            FlowError::Step { failure, .. } => assert_eq!(failure.step, STEP_INSERT_ADDRESS),
            other => panic!("expected step failure, got {other:?}"),
        }
        assert_eq!(backend.row_count(tables::STORES).await, 0);
        assert_eq!(backend.row_count(tables::STORE_CONTACTS).await, 0);
        assert_eq!(backend.row_count(tables::STORE_ADDRESSES).await, 0);
    }

    #[tokio::test]
    async fn validation_failure_issues_no_writes() {
        let backend = InMemoryBackend::new();
        let mut d = draft();
        d.description = "shop".to_string();

        let result = flow(&backend).create(RecordId::new(), d).await;
        assert!(matches!(result, Err(FlowError::Draft(_))));
        assert_eq!(backend.write_call_count(), 0);
    }
}

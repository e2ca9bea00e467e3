//! Reusable write steps shared by the creation flows.
//!
//! Every flow is the same shape: insert the parent row, insert dependent
//! rows referencing it, optionally upload an asset keyed under the parent
//! id, and patch the parent with the asset's URL. These four steps
//! implement that shape once; the flows wire them with entity-specific
//! tables, rows, and buckets.

use async_trait::async_trait;
use backend::{DataStore, ObjectStore};
use domain::FileUpload;
use uuid::Uuid;

use crate::context::FlowContext;
use crate::coordinator::Step;
use crate::error::StepError;

/// Inserts the parent row. Compensation deletes it by id.
pub struct InsertParent<D> {
    name: &'static str,
    data: D,
    table: &'static str,
    row: serde_json::Value,
}

impl<D: DataStore> InsertParent<D> {
    pub fn new(name: &'static str, data: D, table: &'static str, row: serde_json::Value) -> Self {
        Self {
            name,
            data,
            table,
            row,
        }
    }
}

#[async_trait]
impl<D: DataStore> Step<FlowContext> for InsertParent<D> {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn run(&self, ctx: &mut FlowContext) -> Result<(), StepError> {
        let record = self.data.insert(self.table, self.row.clone()).await?;
        ctx.set_parent(self.table, record);
        Ok(())
    }

    async fn compensate(&self, ctx: &mut FlowContext) -> Result<(), StepError> {
        // Delete is idempotent, so compensating twice is harmless.
        if let Some(id) = ctx.parent_id() {
            self.data.delete(self.table, id).await?;
        }
        Ok(())
    }
}

/// Inserts dependent rows stamped with the parent id.
///
/// The batch is treated as one unit: partial application by the backend
/// fails the step, and compensation deletes by the foreign-key field so
/// the applied subset is removed even though its row ids are unknown.
pub struct InsertDependents<D> {
    name: &'static str,
    data: D,
    table: &'static str,
    fk_field: &'static str,
    rows: Vec<serde_json::Value>,
}

impl<D: DataStore> InsertDependents<D> {
    pub fn new(
        name: &'static str,
        data: D,
        table: &'static str,
        fk_field: &'static str,
        rows: Vec<serde_json::Value>,
    ) -> Self {
        Self {
            name,
            data,
            table,
            fk_field,
            rows,
        }
    }
}

#[async_trait]
impl<D: DataStore> Step<FlowContext> for InsertDependents<D> {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn run(&self, ctx: &mut FlowContext) -> Result<(), StepError> {
        let parent_id = ctx
            .parent_id()
            .ok_or(StepError::MissingContext("parent id"))?;

        if self.rows.is_empty() {
            return Ok(());
        }

        let fk = serde_json::json!(parent_id);
        let mut rows = self.rows.clone();
        for row in &mut rows {
            if let Some(fields) = row.as_object_mut() {
                fields.insert(self.fk_field.to_string(), fk.clone());
            }
        }

        let stored = self.data.insert_batch(self.table, rows).await?;
        ctx.record_dependents(self.table, stored.into_iter().map(|r| r.id).collect());
        Ok(())
    }

    async fn compensate(&self, ctx: &mut FlowContext) -> Result<(), StepError> {
        if let Some(parent_id) = ctx.parent_id() {
            self.data
                .delete_matching(self.table, self.fk_field, &serde_json::json!(parent_id))
                .await?;
        }
        Ok(())
    }
}

/// Uploads a file under `{parent_id}/{random}.{ext}`.
///
/// Runs only after the parent insert, since the storage path embeds the
/// parent id. Compensation removes the object; an orphan blob would be
/// unreachable once the parent row is gone, but removal keeps the path
/// free for a retry.
pub struct UploadAsset<O> {
    name: &'static str,
    objects: O,
    bucket: &'static str,
    file: FileUpload,
}

impl<O: ObjectStore> UploadAsset<O> {
    pub fn new(name: &'static str, objects: O, bucket: &'static str, file: FileUpload) -> Self {
        Self {
            name,
            objects,
            bucket,
            file,
        }
    }
}

#[async_trait]
impl<O: ObjectStore> Step<FlowContext> for UploadAsset<O> {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn run(&self, ctx: &mut FlowContext) -> Result<(), StepError> {
        let parent_id = ctx
            .parent_id()
            .ok_or(StepError::MissingContext("parent id"))?;

        let path = format!(
            "{parent_id}/{}.{}",
            Uuid::new_v4().simple(),
            self.file.extension()
        );
        self.objects
            .upload(
                self.bucket,
                &path,
                self.file.bytes.clone(),
                &self.file.content_type,
            )
            .await?;

        let url = self.objects.public_url(self.bucket, &path);
        ctx.set_asset(path, url);
        Ok(())
    }

    async fn compensate(&self, ctx: &mut FlowContext) -> Result<(), StepError> {
        if let Some(path) = ctx.asset_path() {
            self.objects.remove(self.bucket, path).await?;
        }
        Ok(())
    }
}

/// Patches the parent row with the uploaded asset's public URL.
///
/// No compensation of its own: deleting the parent row (step 1's
/// compensation) covers it, since this step never runs standalone.
pub struct PatchAssetRef<D> {
    name: &'static str,
    data: D,
    field: &'static str,
}

impl<D: DataStore> PatchAssetRef<D> {
    pub fn new(name: &'static str, data: D, field: &'static str) -> Self {
        Self { name, data, field }
    }
}

#[async_trait]
impl<D: DataStore> Step<FlowContext> for PatchAssetRef<D> {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn run(&self, ctx: &mut FlowContext) -> Result<(), StepError> {
        let table = ctx
            .parent_table()
            .ok_or(StepError::MissingContext("parent table"))?;
        let id = ctx
            .parent_id()
            .ok_or(StepError::MissingContext("parent id"))?;
        let url = ctx
            .asset_url()
            .ok_or(StepError::MissingContext("asset url"))?
            .to_string();

        let mut patch = serde_json::Map::new();
        patch.insert(self.field.to_string(), serde_json::Value::String(url));

        let updated = self
            .data
            .update(table, id, serde_json::Value::Object(patch))
            .await?;
        ctx.replace_parent(updated);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend::InMemoryBackend;

    #[tokio::test]
    async fn insert_parent_records_context_and_compensates() {
        let backend = InMemoryBackend::new();
        let step = InsertParent::new(
            "insert_team",
            backend.clone(),
            "teams",
            serde_json::json!({"name": "Acme"}),
        );

        let mut ctx = FlowContext::new();
        step.run(&mut ctx).await.unwrap();
        assert_eq!(ctx.parent_table(), Some("teams"));
        assert_eq!(backend.row_count("teams").await, 1);

        step.compensate(&mut ctx).await.unwrap();
        assert_eq!(backend.row_count("teams").await, 0);
    }

    #[tokio::test]
    async fn insert_dependents_requires_parent() {
        let backend = InMemoryBackend::new();
        let step = InsertDependents::new(
            "insert_members",
            backend.clone(),
            "team_members",
            "team_id",
            vec![serde_json::json!({"role": "admin"})],
        );

        let mut ctx = FlowContext::new();
        let err = step.run(&mut ctx).await.unwrap_err();
        assert!(matches!(err, StepError::MissingContext("parent id")));
        assert_eq!(backend.row_count("team_members").await, 0);
    }

    #[tokio::test]
    async fn insert_dependents_stamps_the_foreign_key() {
        let backend = InMemoryBackend::new();
        let parent = backend
            .insert("teams", serde_json::json!({"name": "Acme"}))
            .await
            .unwrap();

        let mut ctx = FlowContext::new();
        ctx.set_parent("teams", parent.clone());

        let step = InsertDependents::new(
            "insert_members",
            backend.clone(),
            "team_members",
            "team_id",
            vec![serde_json::json!({"role": "admin"})],
        );
        step.run(&mut ctx).await.unwrap();

        let rows = backend.fetch_all("team_members").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].field("team_id"),
            Some(&serde_json::json!(parent.id))
        );
        assert_eq!(ctx.dependent_ids("team_members").len(), 1);
    }

    #[tokio::test]
    async fn insert_dependents_compensation_removes_partial_subset() {
        let backend = InMemoryBackend::new();
        let parent = backend
            .insert("teams", serde_json::json!({"name": "Acme"}))
            .await
            .unwrap();

        let mut ctx = FlowContext::new();
        ctx.set_parent("teams", parent);

        // The batch half-applies: one row lands, then the step fails.
        backend.set_batch_failure_after("team_service_types", 1);
        let step = InsertDependents::new(
            "insert_service_types",
            backend.clone(),
            "team_service_types",
            "team_id",
            vec![
                serde_json::json!({"name": "Repair"}),
                serde_json::json!({"name": "Install"}),
            ],
        );

        assert!(step.run(&mut ctx).await.is_err());
        assert_eq!(backend.row_count("team_service_types").await, 1);

        // Compensation deletes by foreign key, not by row id.
        step.compensate(&mut ctx).await.unwrap();
        assert_eq!(backend.row_count("team_service_types").await, 0);
    }

    #[tokio::test]
    async fn insert_dependents_with_no_rows_issues_no_write() {
        let backend = InMemoryBackend::new();
        let parent = backend
            .insert("stores", serde_json::json!({"name": "Downtown"}))
            .await
            .unwrap();
        let writes_before = backend.write_call_count();

        let mut ctx = FlowContext::new();
        ctx.set_parent("stores", parent);

        let step = InsertDependents::new(
            "insert_contacts",
            backend.clone(),
            "store_contacts",
            "store_id",
            vec![],
        );
        step.run(&mut ctx).await.unwrap();
        assert_eq!(backend.write_call_count(), writes_before);
    }

    #[tokio::test]
    async fn upload_asset_keys_path_under_parent_id() {
        let backend = InMemoryBackend::new();
        let parent = backend
            .insert("teams", serde_json::json!({"name": "Acme"}))
            .await
            .unwrap();
        let parent_id = parent.id;

        let mut ctx = FlowContext::new();
        ctx.set_parent("teams", parent);

        let step = UploadAsset::new(
            "upload_logo",
            backend.clone(),
            "team-logos",
            FileUpload::new("logo.png", "image/png", vec![1, 2, 3]),
        );
        step.run(&mut ctx).await.unwrap();

        let path = ctx.asset_path().unwrap();
        assert!(path.starts_with(&format!("{parent_id}/")));
        assert!(path.ends_with(".png"));
        assert!(backend.has_object("team-logos", path).await);
        assert_eq!(
            backend.object_content_type("team-logos", path).await,
            Some("image/png".to_string())
        );

        step.compensate(&mut ctx).await.unwrap();
        assert_eq!(backend.object_count().await, 0);
    }

    #[tokio::test]
    async fn upload_asset_requires_parent() {
        let backend = InMemoryBackend::new();
        let step = UploadAsset::new(
            "upload_logo",
            backend.clone(),
            "team-logos",
            FileUpload::new("logo.png", "image/png", vec![1]),
        );

        let mut ctx = FlowContext::new();
        let err = step.run(&mut ctx).await.unwrap_err();
        assert!(matches!(err, StepError::MissingContext("parent id")));
        assert_eq!(backend.object_count().await, 0);
    }

    #[tokio::test]
    async fn patch_asset_ref_updates_the_parent() {
        let backend = InMemoryBackend::new();
        let parent = backend
            .insert("teams", serde_json::json!({"name": "Acme", "logo": null}))
            .await
            .unwrap();
        let parent_id = parent.id;

        let mut ctx = FlowContext::new();
        ctx.set_parent("teams", parent);
        ctx.set_asset(
            format!("{parent_id}/x.png"),
            format!("https://objects.local/team-logos/{parent_id}/x.png"),
        );

        let step = PatchAssetRef::new("patch_logo_url", backend.clone(), "logo");
        step.run(&mut ctx).await.unwrap();

        let stored = backend.fetch("teams", parent_id).await.unwrap().unwrap();
        assert_eq!(
            stored.field_str("logo"),
            Some(format!("https://objects.local/team-logos/{parent_id}/x.png").as_str())
        );
        // The context now holds the patched row.
        assert_eq!(
            ctx.parent().unwrap().field_str("logo"),
            stored.field_str("logo")
        );
    }

    #[tokio::test]
    async fn patch_asset_ref_requires_asset_url() {
        let backend = InMemoryBackend::new();
        let parent = backend
            .insert("teams", serde_json::json!({"name": "Acme"}))
            .await
            .unwrap();

        let mut ctx = FlowContext::new();
        ctx.set_parent("teams", parent);

        let step = PatchAssetRef::new("patch_logo_url", backend.clone(), "logo");
        let err = step.run(&mut ctx).await.unwrap_err();
        assert!(matches!(err, StepError::MissingContext("asset url")));
    }

    #[tokio::test]
    async fn parent_compensation_tolerates_missing_context() {
        let backend = InMemoryBackend::new();
        let step = InsertParent::new(
            "insert_team",
            backend.clone(),
            "teams",
            serde_json::json!({"name": "Acme"}),
        );

        // Nothing inserted; compensate must still succeed.
        let mut ctx = FlowContext::new();
        step.compensate(&mut ctx).await.unwrap();
    }
}

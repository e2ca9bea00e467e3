//! Shared context threaded through a transaction's steps.

use backend::StoredRecord;
use common::RecordId;

/// Accumulates step outputs during one creation flow.
///
/// The parent insert records the stored row and its table; later steps
/// read the parent id from here, and the asset steps add the storage
/// path and public URL.
#[derive(Debug, Default)]
pub struct FlowContext {
    parent_table: Option<&'static str>,
    parent: Option<StoredRecord>,
    dependents: Vec<(&'static str, Vec<RecordId>)>,
    asset_path: Option<String>,
    asset_url: Option<String>,
}

impl FlowContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the inserted parent row.
    pub fn set_parent(&mut self, table: &'static str, record: StoredRecord) {
        self.parent_table = Some(table);
        self.parent = Some(record);
    }

    /// Replaces the parent row after a patch.
    pub fn replace_parent(&mut self, record: StoredRecord) {
        self.parent = Some(record);
    }

    /// The parent row, if inserted.
    pub fn parent(&self) -> Option<&StoredRecord> {
        self.parent.as_ref()
    }

    /// The parent row's id, if inserted.
    pub fn parent_id(&self) -> Option<RecordId> {
        self.parent.as_ref().map(|r| r.id)
    }

    /// The table the parent row was inserted into.
    pub fn parent_table(&self) -> Option<&'static str> {
        self.parent_table
    }

    /// Records the ids of a batch of dependent rows.
    pub fn record_dependents(&mut self, table: &'static str, ids: Vec<RecordId>) {
        self.dependents.push((table, ids));
    }

    /// Ids of the dependent rows inserted into `table`.
    pub fn dependent_ids(&self, table: &str) -> &[RecordId] {
        self.dependents
            .iter()
            .find(|(t, _)| *t == table)
            .map(|(_, ids)| ids.as_slice())
            .unwrap_or(&[])
    }

    /// Total number of dependent rows recorded.
    pub fn dependent_count(&self) -> usize {
        self.dependents.iter().map(|(_, ids)| ids.len()).sum()
    }

    /// Records the uploaded asset's storage path and public URL.
    pub fn set_asset(&mut self, path: String, url: String) {
        self.asset_path = Some(path);
        self.asset_url = Some(url);
    }

    /// Storage path of the uploaded asset, if any.
    pub fn asset_path(&self) -> Option<&str> {
        self.asset_path.as_deref()
    }

    /// Public URL of the uploaded asset, if any.
    pub fn asset_url(&self) -> Option<&str> {
        self.asset_url.as_deref()
    }
}

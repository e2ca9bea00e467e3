//! Two-tier tenant session cache.
//!
//! The active user and team are snapshotted to a persisted store so a
//! restarted client can rehydrate without a login round trip. The
//! snapshot is never authoritative: [`restore`] re-reads the team from
//! the backend and drops it if it no longer exists.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use backend::DataStore;
use common::RecordId;
use domain::{TeamRecord, tables};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The persisted session state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// The signed-in user.
    pub user_id: RecordId,

    /// The team the user last worked under, if any.
    pub active_team: Option<TeamRecord>,
}

/// Storage for the session snapshot.
pub trait SnapshotStore: Send + Sync {
    /// Persists the snapshot, replacing any previous one.
    fn save(&self, snapshot: &SessionSnapshot) -> Result<()>;

    /// Loads the last persisted snapshot, or None.
    fn load(&self) -> Result<Option<SessionSnapshot>>;

    /// Discards the persisted snapshot.
    fn clear(&self) -> Result<()>;
}

/// In-memory snapshot store for tests. Clones share state.
#[derive(Clone, Default)]
pub struct InMemorySnapshotStore {
    snapshot: Arc<RwLock<Option<SessionSnapshot>>>,
}

impl InMemorySnapshotStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn save(&self, snapshot: &SessionSnapshot) -> Result<()> {
        *self.snapshot.write().unwrap() = Some(snapshot.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<SessionSnapshot>> {
        Ok(self.snapshot.read().unwrap().clone())
    }

    fn clear(&self) -> Result<()> {
        *self.snapshot.write().unwrap() = None;
        Ok(())
    }
}

/// Snapshot store backed by a JSON file.
pub struct JsonFileSnapshotStore {
    path: PathBuf,
}

impl JsonFileSnapshotStore {
    /// Creates a store writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file the snapshot is stored in.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl SnapshotStore for JsonFileSnapshotStore {
    fn save(&self, snapshot: &SessionSnapshot) -> Result<()> {
        let json = serde_json::to_vec_pretty(snapshot)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    fn load(&self) -> Result<Option<SessionSnapshot>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Restores the session, reconciling the snapshotted team against the
/// backend.
///
/// The team is refreshed from the authoritative store; if it was deleted
/// since the snapshot was taken, it is dropped and the corrected
/// snapshot is persisted back.
pub async fn restore<D: DataStore>(
    store: &dyn SnapshotStore,
    data: &D,
) -> Result<Option<SessionSnapshot>> {
    let Some(mut snapshot) = store.load()? else {
        return Ok(None);
    };

    if let Some(team) = snapshot.active_team.take() {
        match data.fetch(tables::TEAMS, team.id).await? {
            Some(record) => {
                snapshot.active_team = Some(TeamRecord::from_stored(&record)?);
            }
            None => {
                tracing::warn!(team_id = %team.id, "snapshotted team no longer exists, dropping");
            }
        }
        store.save(&snapshot)?;
    }

    Ok(Some(snapshot))
}

//! Team creation and listing endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use backend::{ChangeFeed, DataStore, ObjectStore};
use common::RecordId;
use domain::{TeamDraft, TeamRecord, tables};
use serde::Deserialize;

use crate::AppState;
use crate::error::ApiError;
use crate::routes::{FileUploadRequest, optimistic_record, parse_record_id, refresh_list};

#[derive(Deserialize)]
pub struct CreateTeamRequest {
    /// Owner user id. Generated when absent (useful for demos).
    pub owner_id: Option<String>,
    pub name: String,
    pub document: String,
    pub location: String,
    #[serde(default)]
    pub service_types: Vec<String>,
    pub logo: Option<FileUploadRequest>,
}

/// POST /teams — run the team creation flow.
#[tracing::instrument(skip(state, req))]
pub async fn create<B>(
    State(state): State<Arc<AppState<B>>>,
    Json(req): Json<CreateTeamRequest>,
) -> Result<(axum::http::StatusCode, Json<TeamRecord>), ApiError>
where
    B: DataStore + ObjectStore + ChangeFeed + Clone + 'static,
{
    let owner_id = match req.owner_id.as_deref() {
        Some(id) => parse_record_id(id)?,
        None => RecordId::new(),
    };

    let draft = TeamDraft {
        name: req.name,
        document: req.document,
        location: req.location,
        service_types: req.service_types,
        logo: req.logo.map(Into::into),
    };

    let team = state.teams.create(owner_id, draft).await?;

    // Optimistic list merge; the change feed delivers the same row again
    // and the idempotent merge keeps one entry.
    if let Some(record) = optimistic_record(team.id, &team) {
        state.team_list.upsert(record).await;
    }

    Ok((axum::http::StatusCode::CREATED, Json(team)))
}

/// GET /teams — list teams from the cache, refreshed from the store.
#[tracing::instrument(skip(state))]
pub async fn list<B>(
    State(state): State<Arc<AppState<B>>>,
) -> Result<Json<Vec<TeamRecord>>, ApiError>
where
    B: DataStore + ObjectStore + ChangeFeed + Clone + 'static,
{
    refresh_list(&state.backend, tables::TEAMS, &state.team_list).await?;

    let teams: Vec<TeamRecord> = state
        .team_list
        .all()
        .await
        .iter()
        .filter_map(|record| TeamRecord::from_stored(record).ok())
        .collect();

    Ok(Json(teams))
}

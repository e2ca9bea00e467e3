//! Service creation and listing endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use backend::{ChangeFeed, DataStore, ObjectStore};
use domain::{ClientDraft, ServiceDraft, ServiceRecord, tables};
use serde::Deserialize;

use crate::AppState;
use crate::error::ApiError;
use crate::routes::{FileUploadRequest, optimistic_record, parse_record_id, refresh_list};

#[derive(Deserialize)]
pub struct ClientRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Deserialize)]
pub struct CreateServiceRequest {
    pub team_id: String,
    pub name: String,
    pub description: String,
    pub service_type_id: String,
    pub client: ClientRequest,
    pub attachment: Option<FileUploadRequest>,
}

/// POST /services — run the service creation flow.
#[tracing::instrument(skip(state, req))]
pub async fn create<B>(
    State(state): State<Arc<AppState<B>>>,
    Json(req): Json<CreateServiceRequest>,
) -> Result<(axum::http::StatusCode, Json<ServiceRecord>), ApiError>
where
    B: DataStore + ObjectStore + ChangeFeed + Clone + 'static,
{
    let team_id = parse_record_id(&req.team_id)?;
    let service_type_id = parse_record_id(&req.service_type_id)?;

    let draft = ServiceDraft {
        name: req.name,
        description: req.description,
        service_type_id,
        client: ClientDraft {
            name: req.client.name,
            email: req.client.email,
            phone: req.client.phone,
        },
        attachment: req.attachment.map(Into::into),
    };

    let service = state.services.create(team_id, draft).await?;

    if let Some(record) = optimistic_record(service.id, &service) {
        state.service_list.upsert(record).await;
    }

    Ok((axum::http::StatusCode::CREATED, Json(service)))
}

/// GET /services — list services from the cache, refreshed from the store.
#[tracing::instrument(skip(state))]
pub async fn list<B>(
    State(state): State<Arc<AppState<B>>>,
) -> Result<Json<Vec<ServiceRecord>>, ApiError>
where
    B: DataStore + ObjectStore + ChangeFeed + Clone + 'static,
{
    refresh_list(&state.backend, tables::SERVICES, &state.service_list).await?;

    let services: Vec<ServiceRecord> = state
        .service_list
        .all()
        .await
        .iter()
        .filter_map(|record| ServiceRecord::from_stored(record).ok())
        .collect();

    Ok(Json(services))
}

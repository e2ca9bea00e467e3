//! Store creation and listing endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use backend::{ChangeFeed, DataStore, ObjectStore};
use domain::{AddressDraft, ContactDraft, StoreDraft, StoreRecord, tables};
use serde::Deserialize;

use crate::AppState;
use crate::error::ApiError;
use crate::routes::{FileUploadRequest, optimistic_record, parse_record_id, refresh_list};

#[derive(Deserialize)]
pub struct ContactRequest {
    pub label: String,
    pub value: String,
}

#[derive(Deserialize)]
pub struct AddressRequest {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

#[derive(Deserialize)]
pub struct CreateStoreRequest {
    pub team_id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub contacts: Vec<ContactRequest>,
    pub address: AddressRequest,
    pub image: Option<FileUploadRequest>,
}

/// POST /stores — run the store creation flow.
#[tracing::instrument(skip(state, req))]
pub async fn create<B>(
    State(state): State<Arc<AppState<B>>>,
    Json(req): Json<CreateStoreRequest>,
) -> Result<(axum::http::StatusCode, Json<StoreRecord>), ApiError>
where
    B: DataStore + ObjectStore + ChangeFeed + Clone + 'static,
{
    let team_id = parse_record_id(&req.team_id)?;

    let draft = StoreDraft {
        name: req.name,
        description: req.description,
        contacts: req
            .contacts
            .into_iter()
            .map(|c| ContactDraft {
                label: c.label,
                value: c.value,
            })
            .collect(),
        address: AddressDraft {
            street: req.address.street,
            city: req.address.city,
            state: req.address.state,
            postal_code: req.address.postal_code,
        },
        image: req.image.map(Into::into),
    };

    let store = state.stores.create(team_id, draft).await?;

    if let Some(record) = optimistic_record(store.id, &store) {
        state.store_list.upsert(record).await;
    }

    Ok((axum::http::StatusCode::CREATED, Json(store)))
}

/// GET /stores — list stores from the cache, refreshed from the store.
#[tracing::instrument(skip(state))]
pub async fn list<B>(
    State(state): State<Arc<AppState<B>>>,
) -> Result<Json<Vec<StoreRecord>>, ApiError>
where
    B: DataStore + ObjectStore + ChangeFeed + Clone + 'static,
{
    refresh_list(&state.backend, tables::STORES, &state.store_list).await?;

    let stores: Vec<StoreRecord> = state
        .store_list
        .all()
        .await
        .iter()
        .filter_map(|record| StoreRecord::from_stored(record).ok())
        .collect();

    Ok(Json(stores))
}

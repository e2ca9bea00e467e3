//! Product creation and listing endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use backend::{ChangeFeed, DataStore, ObjectStore};
use domain::{Identifier, ProductDraft, ProductRecord, tables};
use serde::Deserialize;

use crate::AppState;
use crate::error::ApiError;
use crate::routes::{FileUploadRequest, optimistic_record, parse_record_id, refresh_list};

#[derive(Deserialize)]
pub struct IdentifierRequest {
    pub key: String,
    pub value: String,
}

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub team_id: String,
    pub store_id: String,
    pub name: String,
    pub description: String,
    /// Raw form value; validated as a non-negative decimal.
    pub price: String,
    /// Raw form value; validated as a non-negative integer.
    pub stock: String,
    #[serde(default)]
    pub identifiers: Vec<IdentifierRequest>,
    pub media: Option<FileUploadRequest>,
}

/// POST /products — run the product creation flow.
#[tracing::instrument(skip(state, req))]
pub async fn create<B>(
    State(state): State<Arc<AppState<B>>>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(axum::http::StatusCode, Json<ProductRecord>), ApiError>
where
    B: DataStore + ObjectStore + ChangeFeed + Clone + 'static,
{
    let team_id = parse_record_id(&req.team_id)?;
    let store_id = parse_record_id(&req.store_id)?;

    let draft = ProductDraft {
        name: req.name,
        description: req.description,
        price: req.price,
        stock: req.stock,
        store_id,
        identifiers: req
            .identifiers
            .into_iter()
            .map(|i| Identifier {
                key: i.key,
                value: i.value,
            })
            .collect(),
        media: req.media.map(Into::into),
    };

    let product = state.products.create(team_id, draft).await?;

    if let Some(record) = optimistic_record(product.id, &product) {
        state.product_list.upsert(record).await;
    }

    Ok((axum::http::StatusCode::CREATED, Json(product)))
}

/// GET /products — list products from the cache, refreshed from the store.
#[tracing::instrument(skip(state))]
pub async fn list<B>(
    State(state): State<Arc<AppState<B>>>,
) -> Result<Json<Vec<ProductRecord>>, ApiError>
where
    B: DataStore + ObjectStore + ChangeFeed + Clone + 'static,
{
    refresh_list(&state.backend, tables::PRODUCTS, &state.product_list).await?;

    let products: Vec<ProductRecord> = state
        .product_list
        .all()
        .await
        .iter()
        .filter_map(|record| ProductRecord::from_stored(record).ok())
        .collect();

    Ok(Json(products))
}

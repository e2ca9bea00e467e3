//! HTTP facade for the back-office creation flows.
//!
//! Exposes the team/store/service/product creation flows and the cached
//! entity lists over REST, with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use backend::{ChangeFeed, DataStore, ObjectStore};
use cache::{FeedProcessor, ListCache};
use domain::tables;
use flows::{ProductFlow, ServiceFlow, StoreFlow, TeamFlow};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState<B>
where
    B: DataStore + ObjectStore + ChangeFeed + Clone + 'static,
{
    pub backend: B,
    pub teams: TeamFlow<B, B>,
    pub services: ServiceFlow<B, B>,
    pub stores: StoreFlow<B, B>,
    pub products: ProductFlow<B, B>,
    pub team_list: ListCache,
    pub service_list: ListCache,
    pub store_list: ListCache,
    pub product_list: ListCache,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<B>(state: Arc<AppState<B>>, metrics_handle: PrometheusHandle) -> Router
where
    B: DataStore + ObjectStore + ChangeFeed + Clone + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/teams", post(routes::teams::create::<B>))
        .route("/teams", get(routes::teams::list::<B>))
        .route("/services", post(routes::services::create::<B>))
        .route("/services", get(routes::services::list::<B>))
        .route("/stores", post(routes::stores::create::<B>))
        .route("/stores", get(routes::stores::list::<B>))
        .route("/products", post(routes::products::create::<B>))
        .route("/products", get(routes::products::list::<B>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state and the change-feed processor
/// that keeps the list caches in sync. The caller is responsible for
/// driving the processor (usually `tokio::spawn`).
pub fn create_default_state<B>(backend: B) -> (Arc<AppState<B>>, FeedProcessor)
where
    B: DataStore + ObjectStore + ChangeFeed + Clone + 'static,
{
    let team_list = ListCache::new();
    let service_list = ListCache::new();
    let store_list = ListCache::new();
    let product_list = ListCache::new();

    let mut processor = FeedProcessor::new();
    processor.bind(tables::TEAMS, team_list.clone());
    processor.bind(tables::SERVICES, service_list.clone());
    processor.bind(tables::STORES, store_list.clone());
    processor.bind(tables::PRODUCTS, product_list.clone());

    let state = Arc::new(AppState {
        teams: TeamFlow::new(backend.clone(), backend.clone()),
        services: ServiceFlow::new(backend.clone(), backend.clone()),
        stores: StoreFlow::new(backend.clone(), backend.clone()),
        products: ProductFlow::new(backend.clone(), backend.clone()),
        backend,
        team_list,
        service_list,
        store_list,
        product_list,
    });

    (state, processor)
}

/// Catalog listing REST API endpoints
///
/// Read-only views over the asset and tool-component catalog, served from the
/// lock-free registry snapshot. A refresh endpoint reloads the snapshot from
/// storage on demand.

use crate::api::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};

/// Create catalog routes
pub fn create_catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/api/catalog/assets", get(list_assets))
        .route("/api/catalog/components", get(list_components))
        .route("/api/catalog/refresh", post(refresh_catalog))
}

/// List assets available for node reference selection
///
/// GET /api/catalog/assets
async fn list_assets(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "assets": state.catalog.assets() }))
}

/// List tool components available for node binding
///
/// GET /api/catalog/components
async fn list_components(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "components": state.catalog.components() }))
}

/// Reload the catalog snapshot from storage
///
/// POST /api/catalog/refresh
async fn refresh_catalog(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    match state.catalog.refresh().await {
        Ok(()) => {
            let snapshot = state.catalog.load();
            Ok(Json(json!({
                "assets": snapshot.assets.len(),
                "components": snapshot.components.len(),
            })))
        }
        Err(e) => {
            tracing::error!("Failed to refresh catalog: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

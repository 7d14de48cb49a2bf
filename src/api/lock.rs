/// Editing-lock lifecycle REST API endpoints
///
/// Exposes the coordinator's acquire/release/status operations. Acquisition
/// is non-blocking: a held lock answers immediately with the holder's
/// identity instead of queueing the caller.

use crate::api::{actor_from_headers, AppState};
use crate::session::LockDescriptor;
use axum::{
    extract::State,
    http::HeaderMap,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

/// Request body for lock release
#[derive(Debug, Deserialize)]
pub struct ReleaseRequest {
    pub token: String,
}

/// Create lock lifecycle routes
pub fn create_lock_routes() -> Router<AppState> {
    Router::new()
        .route("/api/session/lock", post(acquire_lock))
        .route("/api/session/lock", delete(release_lock))
        .route("/api/session/lock", get(lock_status))
}

/// Try to take the editing lock for the calling actor
///
/// POST /api/session/lock
async fn acquire_lock(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<LockDescriptor> {
    let actor = actor_from_headers(&headers);
    Json(state.lock.acquire(&actor).await)
}

/// Release the editing lock
///
/// DELETE /api/session/lock
/// Body: { "token": "lock-..." }
/// Responds with whether the lock actually transitioned; a stale token is
/// reported as `released: false` rather than silently swallowed.
async fn release_lock(
    State(state): State<AppState>,
    Json(request): Json<ReleaseRequest>,
) -> Json<Value> {
    let released = state.lock.release(&request.token).await;
    Json(json!({ "released": released }))
}

/// Read the current lock state
///
/// GET /api/session/lock
async fn lock_status(State(state): State<AppState>) -> Json<LockDescriptor> {
    Json(state.lock.status().await)
}

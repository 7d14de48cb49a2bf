/// Hosted editor session REST API endpoints
///
/// Thin wrappers over `EditorService`: workspace loading, the per-actor
/// open/save/cancel lifecycle, and workspace persistence. Soft lifecycle
/// outcomes (contention, aborts) are reported in the response body; only
/// validation and transport failures map to error status codes.

use crate::api::{actor_from_headers, AppState};
use crate::session::{AbortReason, EditTarget, OpenOutcome, SaveOutcome, SessionError};
use crate::session::NodeDraft;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

/// Request body for loading a persisted flow into the workspace
#[derive(Debug, Deserialize)]
pub struct LoadRequest {
    pub flow_id: String,
}

/// Request body for seeding the workspace from a template
#[derive(Debug, Deserialize)]
pub struct TemplateRequest {
    pub template_id: String,
}

/// Request body for opening the node form
#[derive(Debug, Deserialize)]
pub struct OpenRequest {
    /// Existing node to edit; omitted when creating a new node
    #[serde(default)]
    pub node_id: Option<String>,
}

/// Request body for persisting the workspace
#[derive(Debug, Deserialize, Default)]
pub struct PersistRequest {
    #[serde(default)]
    pub name: Option<String>,
}

/// Create hosted editor routes
pub fn create_editor_routes() -> Router<AppState> {
    Router::new()
        .route("/api/editor/load", post(load_workspace))
        .route("/api/editor/template", post(load_template))
        .route("/api/editor/new", post(new_workspace))
        .route("/api/editor/open", post(open_editor))
        .route("/api/editor/save", post(save_node))
        .route("/api/editor/cancel", post(cancel_edit))
        .route("/api/editor/graph", get(workspace_graph))
        .route("/api/editor/persist", post(persist_workspace))
}

fn session_error_status(error: &SessionError) -> StatusCode {
    match error {
        SessionError::MissingLabel => StatusCode::BAD_REQUEST,
        SessionError::UnknownNode(_) => StatusCode::NOT_FOUND,
        SessionError::Graph(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SessionError::Transport(_) => StatusCode::BAD_GATEWAY,
    }
}

fn abort_json(reason: &AbortReason) -> Value {
    match reason {
        AbortReason::NotHolding => json!({ "reason": "not_holding" }),
        AbortReason::LockExpired => json!({ "reason": "lock_expired" }),
        AbortReason::TokenMismatch { holder } => {
            json!({ "reason": "token_mismatch", "locked_by": holder })
        }
        AbortReason::HolderMismatch { holder } => {
            json!({ "reason": "holder_mismatch", "locked_by": holder })
        }
    }
}

/// Load a persisted flow into the editing workspace
///
/// POST /api/editor/load
async fn load_workspace(
    State(state): State<AppState>,
    Json(request): Json<LoadRequest>,
) -> Result<Json<Value>, StatusCode> {
    match state.storage.get_flow(&request.flow_id).await {
        Ok(Some(record)) => {
            let name = record.name.clone();
            state.editor.load_flow(record).await;
            Ok(Json(json!({
                "flow_id": request.flow_id,
                "name": name,
                "message": "Workflow loaded into workspace",
            })))
        }
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to load workflow {}: {}", request.flow_id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Seed the workspace from a reusable template
///
/// POST /api/editor/template
async fn load_template(
    State(state): State<AppState>,
    Json(request): Json<TemplateRequest>,
) -> Result<Json<Value>, StatusCode> {
    match state.storage.get_template(&request.template_id).await {
        Ok(Some(record)) => {
            let name = record.name.clone();
            state.editor.load_template(record).await;
            Ok(Json(json!({
                "template_id": request.template_id,
                "name": name,
                "message": "Template loaded into workspace",
            })))
        }
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to load template {}: {}", request.template_id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Reset the workspace to an empty graph
///
/// POST /api/editor/new
async fn new_workspace(State(state): State<AppState>) -> Json<Value> {
    state.editor.new_workspace().await;
    Json(json!({ "message": "Workspace reset" }))
}

/// Open the node form for the calling actor
///
/// POST /api/editor/open
/// Body: { "node_id": "node-3" } to edit, {} to create
async fn open_editor(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<OpenRequest>,
) -> Result<Json<Value>, StatusCode> {
    let actor = actor_from_headers(&headers);
    let target = match request.node_id {
        Some(node_id) => EditTarget::Existing(node_id),
        None => EditTarget::NewNode,
    };

    match state.editor.open(&actor, target).await {
        Ok(OpenOutcome::Opened) => Ok(Json(json!({ "status": "opened" }))),
        Ok(OpenOutcome::Reopened) => Ok(Json(json!({ "status": "reopened" }))),
        Ok(OpenOutcome::Busy { editing }) => {
            let editing = match editing {
                EditTarget::NewNode => Value::Null,
                EditTarget::Existing(id) => Value::String(id),
            };
            Ok(Json(json!({ "status": "busy", "editing": editing })))
        }
        Ok(OpenOutcome::Locked { holder, since }) => Ok(Json(json!({
            "status": "locked",
            "locked_by": holder,
            "locked_at": since,
        }))),
        Err(e) => {
            tracing::warn!(actor = %actor, error = %e, "editor open failed");
            Err(session_error_status(&e))
        }
    }
}

/// Commit the calling actor's open form
///
/// POST /api/editor/save
/// Body: node draft (label, description, connections, trigger, ...)
async fn save_node(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(draft): Json<NodeDraft>,
) -> Result<Json<Value>, StatusCode> {
    let actor = actor_from_headers(&headers);

    match state.editor.save(&actor, draft).await {
        Ok(SaveOutcome::Created { node_id }) => {
            Ok(Json(json!({ "status": "created", "node_id": node_id })))
        }
        Ok(SaveOutcome::Updated { node_id }) => {
            Ok(Json(json!({ "status": "updated", "node_id": node_id })))
        }
        Ok(SaveOutcome::Aborted(reason)) => {
            let mut body = abort_json(&reason);
            body["status"] = Value::String("aborted".to_string());
            Ok(Json(body))
        }
        Err(e) => {
            tracing::warn!(actor = %actor, error = %e, "node save failed");
            Err(session_error_status(&e))
        }
    }
}

/// Close the calling actor's form without saving
///
/// POST /api/editor/cancel
async fn cancel_edit(State(state): State<AppState>, headers: HeaderMap) -> Json<Value> {
    let actor = actor_from_headers(&headers);
    state.editor.cancel(&actor).await;
    Json(json!({ "status": "cancelled" }))
}

/// Current workspace graph in persisted form
///
/// GET /api/editor/graph
async fn workspace_graph(State(state): State<AppState>) -> Json<Value> {
    Json(json!(state.editor.snapshot().await))
}

/// Validate and persist the workspace
///
/// POST /api/editor/persist
/// Body: { "name": "My workflow" } (name optional once the workspace has one)
async fn persist_workspace(
    State(state): State<AppState>,
    Json(request): Json<PersistRequest>,
) -> Result<Json<Value>, StatusCode> {
    match state
        .editor
        .persist(&state.storage, request.name.as_deref())
        .await
    {
        Ok(outcome) => Ok(Json(json!(outcome))),
        Err(e) => {
            tracing::warn!(error = %e, "workspace persist failed");
            Err(StatusCode::UNPROCESSABLE_ENTITY)
        }
    }
}

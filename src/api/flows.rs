/// Workflow and template management REST API endpoints
///
/// CRUD over persisted workflow instances and reusable templates. Incoming
/// payloads are validated through the graph model before they are written;
/// persistence failures surface as errors and never mutate editor state.

use crate::api::AppState;
use crate::flow::{FlowGraph, FlowSnapshot};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Response for flow creation/update operations
#[derive(Debug, Serialize)]
pub struct FlowResponse {
    pub flow_id: String,
    pub message: String,
}

/// Request body for workflow creation and update
#[derive(Debug, Deserialize)]
pub struct SaveFlowRequest {
    pub name: String,
    #[serde(default)]
    pub asset_id: Option<String>,
    #[serde(default)]
    pub template_id: Option<String>,
    pub payload: FlowSnapshot,
}

/// Request body for template creation
#[derive(Debug, Deserialize)]
pub struct SaveTemplateRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub asset_id: Option<String>,
    pub payload: FlowSnapshot,
}

/// Create workflow and template management routes
pub fn create_flow_routes() -> Router<AppState> {
    Router::new()
        .route("/api/flows", post(create_flow))
        .route("/api/flows", get(list_flows))
        .route("/api/flows/{id}", get(get_flow))
        .route("/api/flows/{id}", put(update_flow))
        .route("/api/flows/{id}", delete(delete_flow))
        .route("/api/templates", post(create_template))
        .route("/api/templates", get(list_templates))
        .route("/api/templates/{id}", get(get_template))
        .route("/api/templates/{id}", delete(delete_template))
}

/// Structural check applied to payloads arriving over the API
fn validate_payload(payload: &FlowSnapshot) -> Result<(), StatusCode> {
    if let Err(e) = FlowGraph::from_snapshot(payload.clone()).validate() {
        tracing::warn!(error = %e, "rejected invalid graph payload");
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    Ok(())
}

/// Create a new workflow
///
/// POST /api/flows
async fn create_flow(
    State(state): State<AppState>,
    Json(request): Json<SaveFlowRequest>,
) -> Result<Json<FlowResponse>, StatusCode> {
    if request.name.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    validate_payload(&request.payload)?;

    match state
        .storage
        .create_flow(
            &request.name,
            request.asset_id.as_deref(),
            request.template_id.as_deref(),
            &request.payload,
        )
        .await
    {
        Ok(flow_id) => Ok(Json(FlowResponse {
            flow_id,
            message: format!("Workflow '{}' created successfully", request.name),
        })),
        Err(e) => {
            tracing::error!("Failed to create workflow: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// List all workflows
///
/// GET /api/flows
async fn list_flows(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    match state.storage.list_flows().await {
        Ok(flows) => Ok(Json(json!({ "flows": flows }))),
        Err(e) => {
            tracing::error!("Failed to list workflows: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Get a specific workflow by id
///
/// GET /api/flows/:id
async fn get_flow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    match state.storage.get_flow(&id).await {
        Ok(Some(record)) => Ok(Json(json!(record))),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to get workflow {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Update an existing workflow
///
/// PUT /api/flows/:id
async fn update_flow(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SaveFlowRequest>,
) -> Result<Json<FlowResponse>, StatusCode> {
    if request.name.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    validate_payload(&request.payload)?;

    match state
        .storage
        .update_flow(
            &id,
            &request.name,
            request.asset_id.as_deref(),
            request.template_id.as_deref(),
            &request.payload,
        )
        .await
    {
        Ok(true) => Ok(Json(FlowResponse {
            flow_id: id,
            message: format!("Workflow '{}' updated successfully", request.name),
        })),
        Ok(false) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to update workflow {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Delete a workflow
///
/// DELETE /api/flows/:id
async fn delete_flow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    match state.storage.delete_flow(&id).await {
        Ok(true) => {
            tracing::info!("Deleted workflow: {}", id);
            Ok(Json(json!({ "message": "Workflow deleted successfully" })))
        }
        Ok(false) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to delete workflow {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Create a new reusable template
///
/// POST /api/templates
async fn create_template(
    State(state): State<AppState>,
    Json(request): Json<SaveTemplateRequest>,
) -> Result<Json<Value>, StatusCode> {
    if request.name.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    validate_payload(&request.payload)?;

    match state
        .storage
        .create_template(
            &request.name,
            request.description.as_deref(),
            request.asset_id.as_deref(),
            &request.payload,
        )
        .await
    {
        Ok(template_id) => Ok(Json(json!({
            "template_id": template_id,
            "message": format!("Template '{}' created successfully", request.name),
        }))),
        Err(e) => {
            tracing::error!("Failed to create template: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// List all templates
///
/// GET /api/templates
async fn list_templates(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    match state.storage.list_templates().await {
        Ok(templates) => Ok(Json(json!({ "templates": templates }))),
        Err(e) => {
            tracing::error!("Failed to list templates: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Get a specific template by id
///
/// GET /api/templates/:id
async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    match state.storage.get_template(&id).await {
        Ok(Some(record)) => Ok(Json(json!(record))),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to get template {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Delete a template
///
/// DELETE /api/templates/:id
async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    match state.storage.delete_template(&id).await {
        Ok(true) => Ok(Json(json!({ "message": "Template deleted successfully" }))),
        Ok(false) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to delete template {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

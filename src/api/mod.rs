/// HTTP API Layer
///
/// This module provides the REST API endpoints for the editing backend:
/// - Workflow and template CRUD
/// - Editing-lock lifecycle (acquire/release/status)
/// - The hosted editor session (load/open/save/cancel/persist)
/// - Read-only catalog listings

use crate::catalog::CatalogRegistry;
use crate::editor::EditorService;
use crate::session::LockCoordinator;
use crate::storage::{CatalogStorage, FlowStorage};
use axum::http::HeaderMap;
use std::sync::Arc;

// Workflow and template management endpoints
pub mod flows;

// Lock lifecycle endpoints
pub mod lock;

// Hosted editor session endpoints
pub mod editor;

// Catalog listing endpoints
pub mod catalog;

// Re-export router builders
pub use catalog::create_catalog_routes;
pub use editor::create_editor_routes;
pub use flows::create_flow_routes;
pub use lock::create_lock_routes;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    /// Workflow and template persistence
    pub storage: FlowStorage,
    /// Catalog persistence (exposed for ingest/seeding)
    pub catalog_storage: CatalogStorage,
    /// Lock-free catalog snapshot registry
    pub catalog: Arc<CatalogRegistry>,
    /// Process-wide editing-lock coordinator
    pub lock: Arc<LockCoordinator>,
    /// Hosted editing workspace
    pub editor: Arc<EditorService>,
}

/// Resolve the calling actor's identity
///
/// Identity comes from the `x-actor` header; callers without one are tagged
/// "unknown". Authentication is out of scope here.
pub fn actor_from_headers(headers: &HeaderMap) -> String {
    headers
        .get("x-actor")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

/// Server setup and initialization
///
/// Wires together all components: storage, catalog registry, lock
/// coordinator, editor service and HTTP routes. Provides the application
/// factory used by `main` and by integration tests.

use crate::{
    api::{
        create_catalog_routes, create_editor_routes, create_flow_routes, create_lock_routes,
        AppState,
    },
    catalog::CatalogRegistry,
    config::Config,
    editor::EditorService,
    session::LockCoordinator,
    storage::{CatalogStorage, FlowStorage},
};
use anyhow::Result;
use axum::{routing::get, Router};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Create the main Axum application with all routes
///
/// Initializes the database, schemas, catalog registry, lock coordinator and
/// editor service, and wires them into a complete application.
pub async fn create_app(config: Config) -> Result<Router> {
    tracing::info!(data_dir = %config.database.data_dir, "ensuring data directory exists");
    std::fs::create_dir_all(&config.database.data_dir)
        .map_err(|e| anyhow::anyhow!("Failed to create data directory: {}", e))?;

    let db_path = Path::new(&config.database.data_dir).join("flowdeck.db");
    tracing::info!(path = %db_path.display(), "opening database");
    let options = SqliteConnectOptions::new()
        .filename(&db_path)
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await?;

    tracing::info!("initializing flow storage");
    let storage = FlowStorage::new(pool.clone());
    storage.init_schema().await?;

    tracing::info!("initializing catalog storage");
    let catalog_storage = CatalogStorage::new(pool);
    catalog_storage.init_schema().await?;

    tracing::info!("loading catalog registry");
    let catalog = Arc::new(CatalogRegistry::new(catalog_storage.clone()));
    catalog.refresh().await?;

    tracing::info!("initializing lock coordinator and editor service");
    let lock = Arc::new(LockCoordinator::new());
    let editor = Arc::new(EditorService::new(Arc::clone(&lock)));

    let app_state = AppState {
        storage,
        catalog_storage,
        catalog,
        lock,
        editor,
    };

    tracing::info!("creating HTTP router");
    let app = Router::new()
        .route("/healthz", get(health_check))
        .merge(create_flow_routes())
        .merge(create_lock_routes())
        .merge(create_editor_routes())
        .merge(create_catalog_routes())
        .with_state(app_state);

    tracing::info!("application initialized");

    Ok(app)
}

/// Start the HTTP server with the given configuration
pub async fn start_server(config: Config) -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("Starting Flowdeck server...");

    let app = create_app(config.clone()).await?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Health check endpoint handler
async fn health_check() -> &'static str {
    "ok"
}

/// Flowdeck: collaborative workflow graph editing backend
///
/// Main entry point for the Flowdeck server. Initializes configuration and
/// starts the HTTP server with graph editing, lock coordination and
/// persistence endpoints.

use flowdeck::{config::Config, server::start_server};

/// Application entry point
///
/// Initializes the server with default configuration and starts listening for
/// requests. The server provides:
/// - Workflow and template management API at /api/flows and /api/templates
/// - Editing-lock lifecycle at /api/session/lock
/// - The hosted editor session at /api/editor/*
/// - Catalog listings at /api/catalog/*
/// - Health check at /healthz
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration (defaults to 0.0.0.0:3004 and ./data)
    let config = Config::default();

    // Start the server
    start_server(config).await?;

    Ok(())
}

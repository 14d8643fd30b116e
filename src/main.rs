// Main entry point - Dependency injection and server setup
use std::sync::Arc;

use dashboard_grid::application::document_service::DocumentService;
use dashboard_grid::infrastructure::config::{load_grid_config, load_server_config};
use dashboard_grid::infrastructure::file_repository::FileDocumentRepository;
use dashboard_grid::presentation::app_state::AppState;
use dashboard_grid::presentation::router::build_router;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_server_config()?;
    let addr = config.server.bind_addr()?;
    let grid = load_grid_config()?;
    tracing::info!(
        cell = grid.cell,
        breakpoints = grid.overlay_breakpoints.len(),
        "Grid geometry loaded"
    );

    // Create repository (infrastructure layer)
    let repository = Arc::new(FileDocumentRepository::new(config.server.data_dir.clone()));

    // Create services (application layer)
    let document_service = DocumentService::new(repository.clone());

    // Seed or validate the document before serving
    let document = document_service.get_document().await?;
    tracing::info!(
        path = %repository.path().display(),
        dashboards = document.dashboards.len(),
        "Dashboards document ready"
    );

    let state = Arc::new(AppState {
        document_service,
        grid,
    });

    // Build router (presentation layer)
    let router = build_router(state);

    // Start server
    tracing::info!(%addr, "Starting dashboard-grid document store");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}

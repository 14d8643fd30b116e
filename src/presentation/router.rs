// Route table for the document store
use crate::infrastructure::http_gateway::DOCUMENT_PATH;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{get_document, grid_config, health_check, post_document, put_document};
use axum::{Router, extract::DefaultBodyLimit, routing::get};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

const MAX_BODY_BYTES: usize = 1024 * 1024;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/grid-config", get(grid_config))
        .route(
            DOCUMENT_PATH,
            get(get_document).put(put_document).post(post_document),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

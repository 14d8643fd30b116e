// HTTP request handlers
use crate::application::document_service::DocumentError;
use crate::domain::coordinates::CoordinateModel;
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde_json::{Value, json};
use std::sync::Arc;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

fn error_response(status: StatusCode, code: &'static str) -> Response {
    (status, Json(json!({ "error": code }))).into_response()
}

/// Grid geometry shared by every client
pub async fn grid_config(State(state): State<Arc<AppState>>) -> Json<CoordinateModel> {
    Json(state.grid.clone())
}

/// Full dashboards document
pub async fn get_document(State(state): State<Arc<AppState>>) -> Response {
    match state.document_service.get_document().await {
        Ok(document) => Json(document).into_response(),
        Err(e) => {
            tracing::error!("Error reading dashboards document: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "read_failed")
        }
    }
}

/// Replace the whole document
pub async fn put_document(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!("Rejected dashboards document: {}", e);
            return error_response(StatusCode::BAD_REQUEST, "invalid_payload");
        }
    };

    match state.document_service.replace_document(payload).await {
        Ok(()) => Json(json!({ "ok": true })).into_response(),
        Err(DocumentError::InvalidPayload(reason)) => {
            tracing::warn!(%reason, "Rejected dashboards document");
            error_response(StatusCode::BAD_REQUEST, "invalid_payload")
        }
        Err(e) => {
            tracing::error!("Error writing dashboards document: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "write_failed")
        }
    }
}

/// Create a dashboard from an optional `{ "name": ... }` body
pub async fn post_document(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let name = requested_name(&body);

    match state.document_service.create_dashboard(name.as_deref()).await {
        Ok(id) => Json(json!({ "id": id })).into_response(),
        Err(e) => {
            tracing::error!("Error creating dashboard: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "create_failed")
        }
    }
}

// Missing or unparsable bodies mean "no name".
fn requested_name(body: &[u8]) -> Option<String> {
    let payload: Value = serde_json::from_slice(body).ok()?;
    match payload.get("name")? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the CRUD surface under `/api/v1/ui`, the rendered-view
//! endpoints, and the health probe into a single Axum router. Every route
//! shares one `AppState` carrying the configured storage backend.

pub mod ui;
pub mod view;

use axum::Router;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::response::Json;
use axum::routing::get;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::state::AppState;

/// Maximum accepted request body.
pub const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Full application router.
pub fn app(state: AppState, cors_origin: HeaderValue) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true);

    Router::new()
        .route("/api/v1/ui", get(ui::list_uis).post(ui::save_ui))
        .route("/api/v1/ui/{ui_name}", get(ui::get_ui).delete(ui::delete_ui))
        .route("/api/v1/ui/{ui_name}/view", get(view::view_ui))
        .route("/ui/{ui_name}", get(view::ui_page))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub storage_mode: &'static str,
}

/// `GET /health`: liveness plus the active storage backend.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok", storage_mode: state.store.mode().as_str() })
}

/// Validate a `{ui_name}` path segment before it reaches storage.
pub(crate) fn checked_name(raw: &str) -> Result<&str, ApiError> {
    uischema::validate_name(raw).map_err(|e| e.under("uiName"))?;
    Ok(raw)
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

//! CRUD routes for named UI schemas.
//!
//! Validation runs before any storage call: a request that fails
//! `validate_save_request` or carries a malformed `{ui_name}` never reaches
//! the backend.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;
use tracing::{info, warn};
use uischema::UiSchema;

use super::checked_name;
use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::{StorageError, UiSummary};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    pub success: bool,
    pub message: &'static str,
    pub ui_name: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub uis: Vec<UiSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UiResponse {
    pub ui_name: String,
    pub schema: UiSchema,
    #[serde(with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<OffsetDateTime>,
}

/// `POST /api/v1/ui`: validate and store `{uiName, schema}`.
pub async fn save_ui(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<SaveResponse>), ApiError> {
    let Json(body) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let (name, schema) = uischema::validate_save_request(&body)?;

    let duplicates = schema.duplicate_input_names();
    if !duplicates.is_empty() {
        warn!(ui_name = %name, ?duplicates, "text inputs share a name; their values will collide");
    }

    state.store.save(&name, &schema).await?;
    info!(ui_name = %name, elements = schema.node_count(), "UI schema saved");

    Ok((
        StatusCode::CREATED,
        Json(SaveResponse { success: true, message: "UI schema saved successfully", ui_name: name }),
    ))
}

/// `GET /api/v1/ui`: list stored names, newest first.
pub async fn list_uis(State(state): State<AppState>) -> Result<Json<ListResponse>, ApiError> {
    let uis = state.store.list().await?;
    Ok(Json(ListResponse { uis }))
}

/// `GET /api/v1/ui/{ui_name}`: fetch one schema.
pub async fn get_ui(
    State(state): State<AppState>,
    Path(ui_name): Path<String>,
) -> Result<Json<UiResponse>, ApiError> {
    let name = checked_name(&ui_name)?;
    let ui = state.store.get(name).await?.ok_or_else(|| StorageError::NotFound(name.to_owned()))?;
    Ok(Json(UiResponse { ui_name: ui.name, schema: ui.schema, created_at: ui.created_at }))
}

/// `DELETE /api/v1/ui/{ui_name}`: remove one schema.
pub async fn delete_ui(
    State(state): State<AppState>,
    Path(ui_name): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let name = checked_name(&ui_name)?;
    state.store.delete(name).await?;
    info!(ui_name = %name, "UI schema deleted");
    Ok(Json(DeleteResponse { success: true, message: "UI deleted successfully" }))
}

#[cfg(test)]
#[path = "ui_test.rs"]
mod tests;

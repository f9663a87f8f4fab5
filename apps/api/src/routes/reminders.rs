use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AppError;
use crate::filters::ReminderFilter;
use crate::models::reminder::ReminderPatch;
use crate::payload::{extract_json, extract_path, extract_query};
use crate::routes::deleted;
use crate::services::reminders::{self, ReminderView};
use crate::state::AppState;

/// GET /api/reminders
pub async fn handle_list_reminders(
    State(state): State<AppState>,
    filter: Result<Query<ReminderFilter>, QueryRejection>,
) -> Result<Json<Vec<ReminderView>>, AppError> {
    let filter = extract_query(filter)?;
    Ok(Json(reminders::list(&state.store, &filter).await?))
}

/// GET /api/reminders/:id
pub async fn handle_get_reminder(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ReminderView>, AppError> {
    let id = extract_path(id)?;
    Ok(Json(reminders::get(&state.store, id).await?))
}

/// POST /api/reminders
pub async fn handle_create_reminder(
    State(state): State<AppState>,
    body: Result<Json<ReminderPatch>, JsonRejection>,
) -> Result<(StatusCode, Json<ReminderView>), AppError> {
    let patch = extract_json(body)?;
    let created = reminders::create(&state.store, patch).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /api/reminders/:id
pub async fn handle_update_reminder(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<ReminderPatch>, JsonRejection>,
) -> Result<Json<ReminderView>, AppError> {
    let id = extract_path(id)?;
    let patch = extract_json(body)?;
    Ok(Json(reminders::update(&state.store, id, patch).await?))
}

/// DELETE /api/reminders/:id
pub async fn handle_delete_reminder(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let id = extract_path(id)?;
    reminders::delete(&state.store, id).await?;
    Ok(deleted())
}

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
use crate::filters::TaskFilter;
use crate::models::task::TaskPatch;
use crate::payload::{extract_json, extract_path, extract_query};
use crate::routes::deleted;
use crate::services::tasks::{self, TaskView};
use crate::state::AppState;

/// GET /api/tasks
pub async fn handle_list_tasks(
    State(state): State<AppState>,
    filter: Result<Query<TaskFilter>, QueryRejection>,
) -> Result<Json<Vec<TaskView>>, AppError> {
    let filter = extract_query(filter)?;
    Ok(Json(tasks::list(&state.store, &filter).await?))
}

/// GET /api/tasks/:id
pub async fn handle_get_task(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<TaskView>, AppError> {
    let id = extract_path(id)?;
    Ok(Json(tasks::get(&state.store, id).await?))
}

/// POST /api/tasks
pub async fn handle_create_task(
    State(state): State<AppState>,
    body: Result<Json<TaskPatch>, JsonRejection>,
) -> Result<(StatusCode, Json<TaskView>), AppError> {
    let patch = extract_json(body)?;
    let created = tasks::create(&state.store, patch).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /api/tasks/:id
pub async fn handle_update_task(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<TaskPatch>, JsonRejection>,
) -> Result<Json<TaskView>, AppError> {
    let id = extract_path(id)?;
    let patch = extract_json(body)?;
    Ok(Json(tasks::update(&state.store, id, patch).await?))
}

/// DELETE /api/tasks/:id
pub async fn handle_delete_task(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let id = extract_path(id)?;
    tasks::delete(&state.store, id).await?;
    Ok(deleted())
}

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
use crate::filters::LearningFilter;
use crate::models::learning::{LearningItem, LearningItemPatch};
use crate::payload::{extract_json, extract_path, extract_query};
use crate::routes::deleted;
use crate::services::learning;
use crate::state::AppState;

/// GET /api/learning
pub async fn handle_list_learning_items(
    State(state): State<AppState>,
    filter: Result<Query<LearningFilter>, QueryRejection>,
) -> Result<Json<Vec<LearningItem>>, AppError> {
    let filter = extract_query(filter)?;
    Ok(Json(learning::list(&state.store, &filter).await?))
}

/// GET /api/learning/:id
pub async fn handle_get_learning_item(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<LearningItem>, AppError> {
    let id = extract_path(id)?;
    Ok(Json(learning::get(&state.store, id).await?))
}

/// POST /api/learning
pub async fn handle_create_learning_item(
    State(state): State<AppState>,
    body: Result<Json<LearningItemPatch>, JsonRejection>,
) -> Result<(StatusCode, Json<LearningItem>), AppError> {
    let patch = extract_json(body)?;
    let created = learning::create(&state.store, patch).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /api/learning/:id
pub async fn handle_update_learning_item(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<LearningItemPatch>, JsonRejection>,
) -> Result<Json<LearningItem>, AppError> {
    let id = extract_path(id)?;
    let patch = extract_json(body)?;
    Ok(Json(learning::update(&state.store, id, patch).await?))
}

/// DELETE /api/learning/:id
pub async fn handle_delete_learning_item(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let id = extract_path(id)?;
    learning::delete(&state.store, id).await?;
    Ok(deleted())
}

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
use crate::filters::ResourceFilter;
use crate::models::resource::ResourcePatch;
use crate::payload::{extract_json, extract_path, extract_query};
use crate::routes::deleted;
use crate::services::resources::{self, ResourceView};
use crate::state::AppState;

/// GET /api/resources
pub async fn handle_list_resources(
    State(state): State<AppState>,
    filter: Result<Query<ResourceFilter>, QueryRejection>,
) -> Result<Json<Vec<ResourceView>>, AppError> {
    let filter = extract_query(filter)?;
    Ok(Json(resources::list(&state.store, &filter).await?))
}

/// GET /api/resources/:id
pub async fn handle_get_resource(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ResourceView>, AppError> {
    let id = extract_path(id)?;
    Ok(Json(resources::get(&state.store, id).await?))
}

/// POST /api/resources
pub async fn handle_create_resource(
    State(state): State<AppState>,
    body: Result<Json<ResourcePatch>, JsonRejection>,
) -> Result<(StatusCode, Json<ResourceView>), AppError> {
    let patch = extract_json(body)?;
    let created = resources::create(&state.store, patch).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /api/resources/:id
pub async fn handle_update_resource(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<ResourcePatch>, JsonRejection>,
) -> Result<Json<ResourceView>, AppError> {
    let id = extract_path(id)?;
    let patch = extract_json(body)?;
    Ok(Json(resources::update(&state.store, id, patch).await?))
}

/// DELETE /api/resources/:id
pub async fn handle_delete_resource(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let id = extract_path(id)?;
    resources::delete(&state.store, id).await?;
    Ok(deleted())
}

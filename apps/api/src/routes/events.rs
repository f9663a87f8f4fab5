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
use crate::filters::EventFilter;
use crate::models::event::EventPatch;
use crate::payload::{extract_json, extract_path, extract_query};
use crate::routes::deleted;
use crate::services::events::{self, EventView};
use crate::state::AppState;

/// GET /api/events
pub async fn handle_list_events(
    State(state): State<AppState>,
    filter: Result<Query<EventFilter>, QueryRejection>,
) -> Result<Json<Vec<EventView>>, AppError> {
    let filter = extract_query(filter)?;
    Ok(Json(events::list(&state.store, &filter).await?))
}

/// GET /api/events/:id
pub async fn handle_get_event(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<EventView>, AppError> {
    let id = extract_path(id)?;
    Ok(Json(events::get(&state.store, id).await?))
}

/// POST /api/events
pub async fn handle_create_event(
    State(state): State<AppState>,
    body: Result<Json<EventPatch>, JsonRejection>,
) -> Result<(StatusCode, Json<EventView>), AppError> {
    let patch = extract_json(body)?;
    let created = events::create(&state.store, patch).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /api/events/:id
pub async fn handle_update_event(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<EventPatch>, JsonRejection>,
) -> Result<Json<EventView>, AppError> {
    let id = extract_path(id)?;
    let patch = extract_json(body)?;
    Ok(Json(events::update(&state.store, id, patch).await?))
}

/// DELETE /api/events/:id
pub async fn handle_delete_event(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let id = extract_path(id)?;
    events::delete(&state.store, id).await?;
    Ok(deleted())
}

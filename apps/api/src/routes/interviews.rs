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
use crate::filters::InterviewFilter;
use crate::models::interview::InterviewPatch;
use crate::payload::{extract_json, extract_path, extract_query};
use crate::routes::deleted;
use crate::services::interviews::{self, InterviewView};
use crate::state::AppState;

/// GET /api/interviews
pub async fn handle_list_interviews(
    State(state): State<AppState>,
    filter: Result<Query<InterviewFilter>, QueryRejection>,
) -> Result<Json<Vec<InterviewView>>, AppError> {
    let filter = extract_query(filter)?;
    Ok(Json(interviews::list(&state.store, &filter).await?))
}

/// GET /api/interviews/:id
pub async fn handle_get_interview(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<InterviewView>, AppError> {
    let id = extract_path(id)?;
    Ok(Json(interviews::get(&state.store, id).await?))
}

/// POST /api/interviews
pub async fn handle_create_interview(
    State(state): State<AppState>,
    body: Result<Json<InterviewPatch>, JsonRejection>,
) -> Result<(StatusCode, Json<InterviewView>), AppError> {
    let patch = extract_json(body)?;
    let created = interviews::create(&state.store, patch).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /api/interviews/:id
pub async fn handle_update_interview(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<InterviewPatch>, JsonRejection>,
) -> Result<Json<InterviewView>, AppError> {
    let id = extract_path(id)?;
    let patch = extract_json(body)?;
    Ok(Json(interviews::update(&state.store, id, patch).await?))
}

/// DELETE /api/interviews/:id
pub async fn handle_delete_interview(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let id = extract_path(id)?;
    interviews::delete(&state.store, id).await?;
    Ok(deleted())
}

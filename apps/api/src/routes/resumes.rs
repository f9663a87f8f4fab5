//! Resumes plus the four part collections. The part handlers are generic
//! over [`ResumePart`] and mounted once per part type.

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
use crate::filters::ResumeChildFilter;
use crate::models::resume::{Resume, ResumePatch};
use crate::payload::{extract_json, extract_path, extract_query};
use crate::routes::deleted;
use crate::services::resumes::{self, ResumeDetail, ResumePart};
use crate::state::AppState;

/// GET /api/resumes
pub async fn handle_list_resumes(
    State(state): State<AppState>,
) -> Result<Json<Vec<Resume>>, AppError> {
    Ok(Json(resumes::list(&state.store).await?))
}

/// GET /api/resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ResumeDetail>, AppError> {
    let id = extract_path(id)?;
    Ok(Json(resumes::get(&state.store, id).await?))
}

/// POST /api/resumes
pub async fn handle_create_resume(
    State(state): State<AppState>,
    body: Result<Json<ResumePatch>, JsonRejection>,
) -> Result<(StatusCode, Json<Resume>), AppError> {
    let patch = extract_json(body)?;
    let resume = resumes::create(&state.store, patch).await?;
    Ok((StatusCode::CREATED, Json(resume)))
}

/// PATCH /api/resumes/:id
pub async fn handle_update_resume(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<ResumePatch>, JsonRejection>,
) -> Result<Json<Resume>, AppError> {
    let id = extract_path(id)?;
    let patch = extract_json(body)?;
    Ok(Json(resumes::update(&state.store, id, patch).await?))
}

/// DELETE /api/resumes/:id
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let id = extract_path(id)?;
    resumes::delete(&state.store, id).await?;
    Ok(deleted())
}

/// GET /api/{experiences,projects,skills,education}
pub async fn handle_list_parts<P: ResumePart>(
    State(state): State<AppState>,
    filter: Result<Query<ResumeChildFilter>, QueryRejection>,
) -> Result<Json<Vec<P>>, AppError> {
    let filter = extract_query(filter)?;
    Ok(Json(resumes::list_parts::<P>(&state.store, &filter).await?))
}

pub async fn handle_get_part<P: ResumePart>(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<P>, AppError> {
    let id = extract_path(id)?;
    Ok(Json(resumes::get_part::<P>(&state.store, id).await?))
}

pub async fn handle_create_part<P: ResumePart>(
    State(state): State<AppState>,
    body: Result<Json<P::Patch>, JsonRejection>,
) -> Result<(StatusCode, Json<P>), AppError> {
    let patch = extract_json(body)?;
    let part = resumes::create_part::<P>(&state.store, patch).await?;
    Ok((StatusCode::CREATED, Json(part)))
}

pub async fn handle_update_part<P: ResumePart>(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<P::Patch>, JsonRejection>,
) -> Result<Json<P>, AppError> {
    let id = extract_path(id)?;
    let patch = extract_json(body)?;
    Ok(Json(resumes::update_part::<P>(&state.store, id, patch).await?))
}

pub async fn handle_delete_part<P: ResumePart>(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let id = extract_path(id)?;
    resumes::delete_part::<P>(&state.store, id).await?;
    Ok(deleted())
}

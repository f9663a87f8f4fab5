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
use crate::filters::SectionFilter;
use crate::models::resume_template::{
    ResumeSection, ResumeSectionPatch, ResumeTemplate, ResumeTemplatePatch,
};
use crate::payload::{extract_json, extract_path, extract_query};
use crate::routes::deleted;
use crate::services::resume_templates::{self, TemplateDetail};
use crate::state::AppState;

/// GET /api/resume-templates
pub async fn handle_list_templates(
    State(state): State<AppState>,
) -> Result<Json<Vec<ResumeTemplate>>, AppError> {
    Ok(Json(resume_templates::list(&state.store).await?))
}

/// GET /api/resume-templates/:id
pub async fn handle_get_template(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<TemplateDetail>, AppError> {
    let id = extract_path(id)?;
    Ok(Json(resume_templates::get(&state.store, id).await?))
}

/// POST /api/resume-templates
pub async fn handle_create_template(
    State(state): State<AppState>,
    body: Result<Json<ResumeTemplatePatch>, JsonRejection>,
) -> Result<(StatusCode, Json<ResumeTemplate>), AppError> {
    let patch = extract_json(body)?;
    let template = resume_templates::create(&state.store, patch).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

/// PATCH /api/resume-templates/:id
pub async fn handle_update_template(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<ResumeTemplatePatch>, JsonRejection>,
) -> Result<Json<ResumeTemplate>, AppError> {
    let id = extract_path(id)?;
    let patch = extract_json(body)?;
    Ok(Json(resume_templates::update(&state.store, id, patch).await?))
}

/// DELETE /api/resume-templates/:id
pub async fn handle_delete_template(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let id = extract_path(id)?;
    resume_templates::delete(&state.store, id).await?;
    Ok(deleted())
}

/// GET /api/resume-sections
pub async fn handle_list_sections(
    State(state): State<AppState>,
    filter: Result<Query<SectionFilter>, QueryRejection>,
) -> Result<Json<Vec<ResumeSection>>, AppError> {
    let filter = extract_query(filter)?;
    Ok(Json(resume_templates::list_sections(&state.store, &filter).await?))
}

/// GET /api/resume-sections/:id
pub async fn handle_get_section(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ResumeSection>, AppError> {
    let id = extract_path(id)?;
    Ok(Json(resume_templates::get_section(&state.store, id).await?))
}

/// POST /api/resume-sections
pub async fn handle_create_section(
    State(state): State<AppState>,
    body: Result<Json<ResumeSectionPatch>, JsonRejection>,
) -> Result<(StatusCode, Json<ResumeSection>), AppError> {
    let patch = extract_json(body)?;
    let section = resume_templates::create_section(&state.store, patch).await?;
    Ok((StatusCode::CREATED, Json(section)))
}

/// PATCH /api/resume-sections/:id
pub async fn handle_update_section(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<ResumeSectionPatch>, JsonRejection>,
) -> Result<Json<ResumeSection>, AppError> {
    let id = extract_path(id)?;
    let patch = extract_json(body)?;
    Ok(Json(resume_templates::update_section(&state.store, id, patch).await?))
}

/// DELETE /api/resume-sections/:id
pub async fn handle_delete_section(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let id = extract_path(id)?;
    resume_templates::delete_section(&state.store, id).await?;
    Ok(deleted())
}

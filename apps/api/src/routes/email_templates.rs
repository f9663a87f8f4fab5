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
use crate::filters::EmailTemplateFilter;
use crate::models::email_template::{EmailTemplate, EmailTemplatePatch};
use crate::payload::{extract_json, extract_path, extract_query};
use crate::routes::deleted;
use crate::services::email_templates;
use crate::state::AppState;

/// GET /api/email-templates
pub async fn handle_list_email_templates(
    State(state): State<AppState>,
    filter: Result<Query<EmailTemplateFilter>, QueryRejection>,
) -> Result<Json<Vec<EmailTemplate>>, AppError> {
    let filter = extract_query(filter)?;
    Ok(Json(email_templates::list(&state.store, &filter).await?))
}

/// GET /api/email-templates/:id
pub async fn handle_get_email_template(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<EmailTemplate>, AppError> {
    let id = extract_path(id)?;
    Ok(Json(email_templates::get(&state.store, id).await?))
}

/// POST /api/email-templates
pub async fn handle_create_email_template(
    State(state): State<AppState>,
    body: Result<Json<EmailTemplatePatch>, JsonRejection>,
) -> Result<(StatusCode, Json<EmailTemplate>), AppError> {
    let patch = extract_json(body)?;
    let created = email_templates::create(&state.store, patch).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /api/email-templates/:id
pub async fn handle_update_email_template(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<EmailTemplatePatch>, JsonRejection>,
) -> Result<Json<EmailTemplate>, AppError> {
    let id = extract_path(id)?;
    let patch = extract_json(body)?;
    Ok(Json(email_templates::update(&state.store, id, patch).await?))
}

/// DELETE /api/email-templates/:id
pub async fn handle_delete_email_template(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let id = extract_path(id)?;
    email_templates::delete(&state.store, id).await?;
    Ok(deleted())
}

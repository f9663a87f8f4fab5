use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::company::{Company, CompanyPatch};
use crate::payload::{extract_json, extract_path};
use crate::routes::deleted;
use crate::services::companies::{self, CompanyDetail};
use crate::state::AppState;

/// GET /api/companies
pub async fn handle_list_companies(
    State(state): State<AppState>,
) -> Result<Json<Vec<Company>>, AppError> {
    Ok(Json(companies::list(&state.store).await?))
}

/// GET /api/companies/:id
pub async fn handle_get_company(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<CompanyDetail>, AppError> {
    let id = extract_path(id)?;
    Ok(Json(companies::get(&state.store, id).await?))
}

/// POST /api/companies
pub async fn handle_create_company(
    State(state): State<AppState>,
    body: Result<Json<CompanyPatch>, JsonRejection>,
) -> Result<(StatusCode, Json<Company>), AppError> {
    let patch = extract_json(body)?;
    let company = companies::create(&state.store, patch).await?;
    Ok((StatusCode::CREATED, Json(company)))
}

/// PATCH /api/companies/:id
pub async fn handle_update_company(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<CompanyPatch>, JsonRejection>,
) -> Result<Json<Company>, AppError> {
    let id = extract_path(id)?;
    let patch = extract_json(body)?;
    Ok(Json(companies::update(&state.store, id, patch).await?))
}

/// DELETE /api/companies/:id
pub async fn handle_delete_company(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let id = extract_path(id)?;
    companies::delete(&state.store, id).await?;
    Ok(deleted())
}

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
use crate::filters::ContactFilter;
use crate::models::contact::ContactPatch;
use crate::payload::{extract_json, extract_path, extract_query};
use crate::routes::deleted;
use crate::services::contacts::{self, ContactView};
use crate::state::AppState;

/// GET /api/contacts
pub async fn handle_list_contacts(
    State(state): State<AppState>,
    filter: Result<Query<ContactFilter>, QueryRejection>,
) -> Result<Json<Vec<ContactView>>, AppError> {
    let filter = extract_query(filter)?;
    Ok(Json(contacts::list(&state.store, &filter).await?))
}

/// GET /api/contacts/:id
pub async fn handle_get_contact(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ContactView>, AppError> {
    let id = extract_path(id)?;
    Ok(Json(contacts::get(&state.store, id).await?))
}

/// POST /api/contacts
pub async fn handle_create_contact(
    State(state): State<AppState>,
    body: Result<Json<ContactPatch>, JsonRejection>,
) -> Result<(StatusCode, Json<ContactView>), AppError> {
    let patch = extract_json(body)?;
    let created = contacts::create(&state.store, patch).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /api/contacts/:id
pub async fn handle_update_contact(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<ContactPatch>, JsonRejection>,
) -> Result<Json<ContactView>, AppError> {
    let id = extract_path(id)?;
    let patch = extract_json(body)?;
    Ok(Json(contacts::update(&state.store, id, patch).await?))
}

/// DELETE /api/contacts/:id
pub async fn handle_delete_contact(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let id = extract_path(id)?;
    contacts::delete(&state.store, id).await?;
    Ok(deleted())
}

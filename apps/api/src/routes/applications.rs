use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, Multipart, Path, Query, Request, State,
    },
    http::{header::CONTENT_TYPE, StatusCode},
    Json,
};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::errors::AppError;
use crate::filters::ApplicationFilter;
use crate::models::application::ApplicationPatch;
use crate::payload::{extract_json, extract_path, extract_query};
use crate::routes::deleted;
use crate::services::applications::{self, ApplicationView};
use crate::state::AppState;
use crate::uploads::{PendingUpload, UploadKind};

/// Form fields sent as text that the JSON payload types as booleans.
const BOOL_FIELDS: &[&str] = &["isReferred"];
/// Form fields sent as text that the JSON payload types as integers.
const INT_FIELDS: &[&str] = &["salaryMin", "salaryMax"];

/// GET /api/applications
pub async fn handle_list_applications(
    State(state): State<AppState>,
    filter: Result<Query<ApplicationFilter>, QueryRejection>,
) -> Result<Json<Vec<ApplicationView>>, AppError> {
    let filter = extract_query(filter)?;
    Ok(Json(applications::list(&state.store, &filter).await?))
}

/// GET /api/applications/:id
pub async fn handle_get_application(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ApplicationView>, AppError> {
    let id = extract_path(id)?;
    Ok(Json(applications::get(&state.store, id).await?))
}

/// POST /api/applications
///
/// Accepts `application/json`, or `multipart/form-data` carrying the same
/// fields as text plus optional `resume` / `coverLetter` file parts.
pub async fn handle_create_application(
    State(state): State<AppState>,
    request: Request,
) -> Result<(StatusCode, Json<ApplicationView>), AppError> {
    let now = Utc::now();
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"));

    if !is_multipart {
        let patch = extract_json(Json::<ApplicationPatch>::from_request(request, &state).await)?;
        let created = applications::create(&state.store, patch, now).await?;
        return Ok((StatusCode::CREATED, Json(created)));
    }

    let multipart = Multipart::from_request(request, &state)
        .await
        .map_err(|err| AppError::Validation(err.body_text()))?;
    let (patch, uploads) = read_form(multipart, now).await?;

    // The row is fully validated before any file is written.
    let application = applications::prepare(&state.store, patch, now).await?;
    for upload in uploads {
        upload.store(state.files.as_ref()).await?;
    }
    let created = applications::insert(&state.store, application).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /api/applications/:id
pub async fn handle_update_application(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<ApplicationPatch>, JsonRejection>,
) -> Result<Json<ApplicationView>, AppError> {
    let id = extract_path(id)?;
    let patch = extract_json(body)?;
    Ok(Json(applications::update(&state.store, id, patch).await?))
}

/// DELETE /api/applications/:id
pub async fn handle_delete_application(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let id = extract_path(id)?;
    applications::delete(&state.store, id).await?;
    Ok(deleted())
}

// ────────────────────────────────────────────────────────────────────────────
// Multipart
// ────────────────────────────────────────────────────────────────────────────

/// Reads every part into a patch plus the uploads it refers to. Upload
/// references are filled into the patch, but nothing is written yet.
async fn read_form(
    mut multipart: Multipart,
    now: DateTime<Utc>,
) -> Result<(ApplicationPatch, Vec<PendingUpload>), AppError> {
    let mut fields = Map::new();
    let mut uploads = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::Validation(err.body_text()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let kind = match name.as_str() {
            "resume" => Some(UploadKind::Resume),
            "coverLetter" => Some(UploadKind::CoverLetter),
            _ => None,
        };

        let file_name = field.file_name().map(str::to_string);
        match (kind, file_name) {
            (Some(kind), Some(file_name)) if !file_name.is_empty() => {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| AppError::Validation(err.body_text()))?;
                uploads.push(PendingUpload::new(kind, &file_name, content_type, bytes, now)?);
            }
            // An empty file input arrives as a part with no file name.
            (Some(_), _) => {}
            (None, _) => {
                let text = field
                    .text()
                    .await
                    .map_err(|err| AppError::Validation(err.body_text()))?;
                if let Some(value) = form_value(&name, text)? {
                    fields.insert(name, value);
                }
            }
        }
    }

    let mut patch: ApplicationPatch = serde_json::from_value(Value::Object(fields))
        .map_err(|err| AppError::Validation(err.to_string()))?;
    for upload in &uploads {
        match upload.kind() {
            UploadKind::Resume => patch.resume_path = Some(upload.reference()),
            UploadKind::CoverLetter => patch.cover_letter_path = Some(Some(upload.reference())),
        }
    }
    Ok((patch, uploads))
}

/// Types one text form field the way the JSON payload would carry it.
/// Empty values are treated as absent.
fn form_value(name: &str, text: String) -> Result<Option<Value>, AppError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    if BOOL_FIELDS.contains(&name) {
        let flag = text
            .parse::<bool>()
            .map_err(|_| AppError::Validation(format!("{name} must be true or false")))?;
        return Ok(Some(Value::Bool(flag)));
    }
    if INT_FIELDS.contains(&name) {
        let number = text
            .parse::<i32>()
            .map_err(|_| AppError::Validation(format!("{name} must be a whole number")))?;
        return Ok(Some(Value::from(number)));
    }
    Ok(Some(Value::String(text.to_string())))
}

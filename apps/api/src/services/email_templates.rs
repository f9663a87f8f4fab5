use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::consistency;
use crate::errors::AppError;
use crate::filters::EmailTemplateFilter;
use crate::models::email_template::{EmailTemplate, EmailTemplatePatch};
use crate::services::fetch;
use crate::store::{Store, Table};

pub async fn list(
    store: &Store,
    filter: &EmailTemplateFilter,
) -> Result<Vec<EmailTemplate>, AppError> {
    Ok(store.list(&filter.query()).await?)
}

pub async fn get(store: &Store, id: Uuid) -> Result<EmailTemplate, AppError> {
    fetch(store, id).await
}

pub async fn create(store: &Store, patch: EmailTemplatePatch) -> Result<EmailTemplate, AppError> {
    let template = EmailTemplate::create(patch, Utc::now())?;
    store.insert(&template).await?;
    info!("Created email template {} ({})", template.id, template.category);
    Ok(template)
}

pub async fn update(
    store: &Store,
    id: Uuid,
    patch: EmailTemplatePatch,
) -> Result<EmailTemplate, AppError> {
    let mut template: EmailTemplate = fetch(store, id).await?;
    template.apply(patch, Utc::now())?;
    if !store.update(&template).await? {
        return Err(AppError::not_found("email template", id));
    }
    Ok(template)
}

pub async fn delete(store: &Store, id: Uuid) -> Result<(), AppError> {
    consistency::delete(store, Table::EmailTemplates, id).await
}

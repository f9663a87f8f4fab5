use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::consistency;
use crate::errors::AppError;
use crate::models::application::Application;
use crate::models::company::{Company, CompanyPatch};
use crate::models::contact::Contact;
use crate::services::fetch;
use crate::store::{Query, Store, Table};

/// A single company with everything filed under it.
#[derive(Debug, Serialize)]
pub struct CompanyDetail {
    #[serde(flatten)]
    pub company: Company,
    pub applications: Vec<Application>,
    pub contacts: Vec<Contact>,
}

pub async fn list(store: &Store) -> Result<Vec<Company>, AppError> {
    Ok(store.list(&Query::new()).await?)
}

pub async fn get(store: &Store, id: Uuid) -> Result<CompanyDetail, AppError> {
    let company: Company = fetch(store, id).await?;
    let applications = store
        .list(&Query::new().eq(Application::COMPANY_ID, id))
        .await?;
    let contacts = store.list(&Query::new().eq(Contact::COMPANY_ID, id)).await?;
    Ok(CompanyDetail {
        company,
        applications,
        contacts,
    })
}

pub async fn create(store: &Store, patch: CompanyPatch) -> Result<Company, AppError> {
    let company = Company::create(patch, Utc::now())?;
    store.insert(&company).await?;
    info!("Created company {} ({})", company.id, company.name);
    Ok(company)
}

pub async fn update(store: &Store, id: Uuid, patch: CompanyPatch) -> Result<Company, AppError> {
    let mut company: Company = fetch(store, id).await?;
    company.apply(patch, Utc::now())?;
    if !store.update(&company).await? {
        return Err(AppError::not_found("company", id));
    }
    Ok(company)
}

/// Applications and contacts go with the company.
pub async fn delete(store: &Store, id: Uuid) -> Result<(), AppError> {
    consistency::delete(store, Table::Companies, id).await
}

use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::consistency::{self, ensure_acyclic};
use crate::errors::AppError;
use crate::filters::ResourceFilter;
use crate::models::resource::{Resource, ResourcePatch};
use crate::services::{fetch, load_children};
use crate::store::{Store, Table};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceView {
    #[serde(flatten)]
    pub resource: Resource,
    pub sub_resources: Vec<Resource>,
}

async fn views(store: &Store, resources: Vec<Resource>) -> Result<Vec<ResourceView>, AppError> {
    let ids = resources.iter().map(|r| r.id).collect();
    let mut children =
        load_children::<Resource, _>(store, Resource::PARENT_ID, ids, |r| r.parent_id).await?;
    Ok(resources
        .into_iter()
        .map(|resource| ResourceView {
            sub_resources: children.remove(&resource.id).unwrap_or_default(),
            resource,
        })
        .collect())
}

async fn view(store: &Store, resource: Resource) -> Result<ResourceView, AppError> {
    views(store, vec![resource])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("resource view went missing")))
}

pub async fn list(store: &Store, filter: &ResourceFilter) -> Result<Vec<ResourceView>, AppError> {
    let resources = store.list(&filter.query()).await?;
    views(store, resources).await
}

pub async fn get(store: &Store, id: Uuid) -> Result<ResourceView, AppError> {
    let resource = fetch(store, id).await?;
    view(store, resource).await
}

pub async fn create(store: &Store, patch: ResourcePatch) -> Result<ResourceView, AppError> {
    let resource = Resource::create(patch, Utc::now())?;
    ensure_acyclic::<Resource, _>(store, resource.id, resource.parent_id, |r| r.parent_id, "parentId")
        .await?;

    store.insert(&resource).await?;
    info!("Created resource {} ({})", resource.id, resource.title);
    view(store, resource).await
}

pub async fn update(store: &Store, id: Uuid, patch: ResourcePatch) -> Result<ResourceView, AppError> {
    let mut resource: Resource = fetch(store, id).await?;
    if let Some(parent) = patch.parent_id {
        ensure_acyclic::<Resource, _>(store, id, parent, |r| r.parent_id, "parentId").await?;
    }

    resource.apply(patch, Utc::now())?;
    if !store.update(&resource).await? {
        return Err(AppError::not_found("resource", id));
    }
    view(store, resource).await
}

/// Sub-resources go with their parent.
pub async fn delete(store: &Store, id: Uuid) -> Result<(), AppError> {
    consistency::delete(store, Table::Resources, id).await
}

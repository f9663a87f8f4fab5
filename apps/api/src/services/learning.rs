use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::consistency;
use crate::derivation;
use crate::errors::AppError;
use crate::filters::LearningFilter;
use crate::models::learning::{LearningItem, LearningItemPatch};
use crate::services::fetch;
use crate::store::{Store, Table};

pub async fn list(store: &Store, filter: &LearningFilter) -> Result<Vec<LearningItem>, AppError> {
    Ok(store.list(&filter.query()).await?)
}

pub async fn get(store: &Store, id: Uuid) -> Result<LearningItem, AppError> {
    fetch(store, id).await
}

pub async fn create(store: &Store, patch: LearningItemPatch) -> Result<LearningItem, AppError> {
    let now = Utc::now();
    let item = LearningItem::create(derivation::learning_item(patch, now), now)?;
    store.insert(&item).await?;
    info!("Created learning item {} ({})", item.id, item.kind);
    Ok(item)
}

pub async fn update(
    store: &Store,
    id: Uuid,
    patch: LearningItemPatch,
) -> Result<LearningItem, AppError> {
    let now = Utc::now();
    let mut item: LearningItem = fetch(store, id).await?;
    item.apply(derivation::learning_item(patch, now), now)?;
    if !store.update(&item).await? {
        return Err(AppError::not_found("learning item", id));
    }
    Ok(item)
}

pub async fn delete(store: &Store, id: Uuid) -> Result<(), AppError> {
    consistency::delete(store, Table::LearningItems, id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::learning::LearningStatus;

    #[tokio::test]
    async fn test_completed_always_means_full_progress() {
        let store = Store::in_memory();
        let item = create(
            &store,
            LearningItemPatch {
                title: Some("Tokio internals".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(item.progress, 0);
        assert_eq!(item.status, LearningStatus::ToLearn);

        let started = update(
            &store,
            item.id,
            LearningItemPatch {
                status: Some(LearningStatus::InProgress),
                progress: Some(30),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(started.started_at.is_some());
        assert_eq!(started.progress, 30);

        let done = update(
            &store,
            item.id,
            LearningItemPatch {
                status: Some(LearningStatus::Completed),
                progress: Some(55),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(done.progress, 100);
        assert!(done.completed_at.is_some());
        assert_eq!(done.started_at, started.started_at);
    }

    #[tokio::test]
    async fn test_progress_out_of_range_rejected() {
        let store = Store::in_memory();
        let err = create(
            &store,
            LearningItemPatch {
                title: Some("Overachiever".into()),
                progress: Some(101),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}

use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::consistency::{self, ensure_optional};
use crate::derivation;
use crate::errors::AppError;
use crate::filters::ReminderFilter;
use crate::models::application::Application;
use crate::models::reminder::{Reminder, ReminderPatch};
use crate::services::{fetch, load_by_ids};
use crate::store::{Store, Table};

#[derive(Debug, Serialize)]
pub struct ReminderView {
    #[serde(flatten)]
    pub reminder: Reminder,
    pub application: Option<Application>,
}

async fn views(store: &Store, reminders: Vec<Reminder>) -> Result<Vec<ReminderView>, AppError> {
    let applications =
        load_by_ids::<Application>(store, reminders.iter().map(|r| r.application_id)).await?;
    Ok(reminders
        .into_iter()
        .map(|reminder| ReminderView {
            application: reminder
                .application_id
                .and_then(|id| applications.get(&id).cloned()),
            reminder,
        })
        .collect())
}

async fn view(store: &Store, reminder: Reminder) -> Result<ReminderView, AppError> {
    let application = match reminder.application_id {
        Some(id) => store.get(id).await?,
        None => None,
    };
    Ok(ReminderView {
        reminder,
        application,
    })
}

pub async fn list(store: &Store, filter: &ReminderFilter) -> Result<Vec<ReminderView>, AppError> {
    let reminders = store.list(&filter.query()).await?;
    views(store, reminders).await
}

pub async fn get(store: &Store, id: Uuid) -> Result<ReminderView, AppError> {
    let reminder = fetch(store, id).await?;
    view(store, reminder).await
}

pub async fn create(store: &Store, patch: ReminderPatch) -> Result<ReminderView, AppError> {
    let now = Utc::now();
    let reminder = Reminder::create(derivation::reminder(patch, now), now)?;
    ensure_optional(store, Table::Applications, reminder.application_id, "applicationId").await?;

    store.insert(&reminder).await?;
    info!("Created reminder {} due {}", reminder.id, reminder.due_date);
    view(store, reminder).await
}

pub async fn update(store: &Store, id: Uuid, patch: ReminderPatch) -> Result<ReminderView, AppError> {
    let now = Utc::now();
    let patch = derivation::reminder(patch, now);
    if let Some(application_id) = patch.application_id {
        ensure_optional(store, Table::Applications, application_id, "applicationId").await?;
    }

    let mut reminder: Reminder = fetch(store, id).await?;
    reminder.apply(patch, now)?;
    if !store.update(&reminder).await? {
        return Err(AppError::not_found("reminder", id));
    }
    view(store, reminder).await
}

pub async fn delete(store: &Store, id: Uuid) -> Result<(), AppError> {
    consistency::delete(store, Table::Reminders, id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn due_tomorrow(title: &str) -> ReminderPatch {
        ReminderPatch {
            title: Some(title.into()),
            due_date: Some(Utc::now() + chrono::Duration::days(1)),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_completion_stamps_and_unstamps() {
        let store = Store::in_memory();
        let created = create(&store, due_tomorrow("Follow up")).await.unwrap();
        assert!(created.reminder.completed_at.is_none());

        let done = update(
            &store,
            created.reminder.id,
            ReminderPatch {
                is_completed: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(done.reminder.is_completed);
        assert!(done.reminder.completed_at.is_some());

        let reopened = update(
            &store,
            created.reminder.id,
            ReminderPatch {
                is_completed: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(reopened.reminder.completed_at.is_none());
    }

    #[tokio::test]
    async fn test_filter_by_completion() {
        let store = Store::in_memory();
        let open = create(&store, due_tomorrow("Open")).await.unwrap();
        create(
            &store,
            ReminderPatch {
                is_completed: Some(true),
                ..due_tomorrow("Done")
            },
        )
        .await
        .unwrap();

        let filter = ReminderFilter {
            is_completed: Some(false),
            application_id: None,
        };
        let listed = list(&store, &filter).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].reminder.id, open.reminder.id);
    }

    #[tokio::test]
    async fn test_missing_due_date_is_rejected() {
        let store = Store::in_memory();
        let err = create(
            &store,
            ReminderPatch {
                title: Some("No date".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref msg) if msg.contains("dueDate")));
        assert!(list(&store, &ReminderFilter::default()).await.unwrap().is_empty());
    }
}

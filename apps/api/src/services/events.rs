use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::consistency::{self, ensure_optional};
use crate::derivation;
use crate::errors::AppError;
use crate::filters::EventFilter;
use crate::models::application::Application;
use crate::models::contact::Contact;
use crate::models::event::{Event, EventPatch};
use crate::services::{fetch, load_by_ids};
use crate::store::{Store, Table};

#[derive(Debug, Serialize)]
pub struct EventView {
    #[serde(flatten)]
    pub event: Event,
    pub application: Option<Application>,
    pub contact: Option<Contact>,
}

async fn views(store: &Store, events: Vec<Event>) -> Result<Vec<EventView>, AppError> {
    let applications =
        load_by_ids::<Application>(store, events.iter().map(|e| e.application_id)).await?;
    let contacts = load_by_ids::<Contact>(store, events.iter().map(|e| e.contact_id)).await?;
    Ok(events
        .into_iter()
        .map(|event| EventView {
            application: event
                .application_id
                .and_then(|id| applications.get(&id).cloned()),
            contact: event.contact_id.and_then(|id| contacts.get(&id).cloned()),
            event,
        })
        .collect())
}

async fn view(store: &Store, event: Event) -> Result<EventView, AppError> {
    views(store, vec![event])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("event view went missing")))
}

pub async fn list(store: &Store, filter: &EventFilter) -> Result<Vec<EventView>, AppError> {
    let events = store.list(&filter.query()).await?;
    views(store, events).await
}

pub async fn get(store: &Store, id: Uuid) -> Result<EventView, AppError> {
    let event = fetch(store, id).await?;
    view(store, event).await
}

pub async fn create(store: &Store, patch: EventPatch) -> Result<EventView, AppError> {
    let now = Utc::now();
    let event = Event::create(derivation::event(patch, now), now)?;
    ensure_optional(store, Table::Applications, event.application_id, "applicationId").await?;
    ensure_optional(store, Table::Contacts, event.contact_id, "contactId").await?;

    store.insert(&event).await?;
    info!("Created {} event {} on {}", event.kind, event.id, event.scheduled_date);
    view(store, event).await
}

pub async fn update(store: &Store, id: Uuid, patch: EventPatch) -> Result<EventView, AppError> {
    let now = Utc::now();
    let patch = derivation::event(patch, now);
    if let Some(application_id) = patch.application_id {
        ensure_optional(store, Table::Applications, application_id, "applicationId").await?;
    }
    if let Some(contact_id) = patch.contact_id {
        ensure_optional(store, Table::Contacts, contact_id, "contactId").await?;
    }

    let mut event: Event = fetch(store, id).await?;
    event.apply(patch, now)?;
    if !store.update(&event).await? {
        return Err(AppError::not_found("event", id));
    }
    view(store, event).await
}

pub async fn delete(store: &Store, id: Uuid) -> Result<(), AppError> {
    consistency::delete(store, Table::Events, id).await
}

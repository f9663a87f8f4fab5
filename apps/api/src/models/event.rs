use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{merge, required};
use crate::payload::{date, nullable, nullable_date};
use crate::store::{Entity, Field, Order, SqlValue, Table};

text_enum!(EventType {
    Reminder => "REMINDER",
    Interview => "INTERVIEW",
    FollowUp => "FOLLOW_UP",
    Networking => "NETWORKING",
    Deadline => "DEADLINE",
    Other => "OTHER",
});

text_enum!(EventStatus {
    Pending => "PENDING",
    Completed => "COMPLETED",
    Cancelled => "CANCELLED",
    Skipped => "SKIPPED",
});

/// A calendar entry, optionally tied to an application and/or a contact.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: EventType,
    pub title: Option<String>,
    pub description: Option<String>,
    pub scheduled_date: DateTime<Utc>,
    pub application_id: Option<Uuid>,
    pub contact_id: Option<Uuid>,
    pub status: EventStatus,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub const APPLICATION_ID: Field = Field::new("application_id", "applicationId");
    pub const CONTACT_ID: Field = Field::new("contact_id", "contactId");
    pub const STATUS: Field = Field::new("status", "status");
    pub const SCHEDULED_DATE: Field = Field::new("scheduled_date", "scheduledDate");

    pub fn create(patch: EventPatch, now: DateTime<Utc>) -> Result<Self, AppError> {
        let mut event = Event {
            id: Uuid::new_v4(),
            kind: EventType::Other,
            title: None,
            description: None,
            scheduled_date: required(patch.scheduled_date, "scheduledDate")?,
            application_id: None,
            contact_id: None,
            status: EventStatus::Pending,
            is_completed: false,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        event.apply(patch, now)?;
        Ok(event)
    }

    pub fn apply(&mut self, patch: EventPatch, now: DateTime<Utc>) -> Result<(), AppError> {
        merge(&mut self.kind, patch.kind);
        merge(&mut self.title, patch.title);
        merge(&mut self.description, patch.description);
        merge(&mut self.scheduled_date, patch.scheduled_date);
        merge(&mut self.application_id, patch.application_id);
        merge(&mut self.contact_id, patch.contact_id);
        merge(&mut self.status, patch.status);
        merge(&mut self.is_completed, patch.is_completed);
        merge(&mut self.completed_at, patch.completed_at);
        self.updated_at = now;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    #[serde(rename = "type")]
    pub kind: Option<EventType>,
    #[serde(default, deserialize_with = "nullable")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "date")]
    pub scheduled_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "nullable")]
    pub application_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "nullable")]
    pub contact_id: Option<Option<Uuid>>,
    pub status: Option<EventStatus>,
    pub is_completed: Option<bool>,
    #[serde(default, deserialize_with = "nullable_date")]
    pub completed_at: Option<Option<DateTime<Utc>>>,
}

impl Entity for Event {
    const TABLE: Table = Table::Events;
    const ORDER: &'static [Order] = &[Order::asc(Self::SCHEDULED_DATE)];

    fn id(&self) -> Uuid {
        self.id
    }

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("id", self.id.into()),
            ("kind", self.kind.into()),
            ("title", self.title.clone().into()),
            ("description", self.description.clone().into()),
            ("scheduled_date", self.scheduled_date.into()),
            ("application_id", self.application_id.into()),
            ("contact_id", self.contact_id.into()),
            ("status", self.status.into()),
            ("is_completed", self.is_completed.into()),
            ("completed_at", self.completed_at.into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
        ]
    }
}

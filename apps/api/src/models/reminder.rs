use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{merge, non_blank, required, required_text};
use crate::payload::{date, nullable, nullable_date};
use crate::store::{Entity, Field, Order, SqlValue, Table};

text_enum!(ReminderType {
    FollowUp => "FOLLOW_UP",
    InterviewPrep => "INTERVIEW_PREP",
    ApplicationDeadline => "APPLICATION_DEADLINE",
    Networking => "NETWORKING",
    Other => "OTHER",
});

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: ReminderType,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub application_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reminder {
    pub const APPLICATION_ID: Field = Field::new("application_id", "applicationId");
    pub const IS_COMPLETED: Field = Field::new("is_completed", "isCompleted");
    pub const DUE_DATE: Field = Field::new("due_date", "dueDate");

    pub fn create(patch: ReminderPatch, now: DateTime<Utc>) -> Result<Self, AppError> {
        let mut reminder = Reminder {
            id: Uuid::new_v4(),
            title: required_text(patch.title.clone(), "title")?,
            description: None,
            due_date: required(patch.due_date, "dueDate")?,
            kind: ReminderType::FollowUp,
            is_completed: false,
            completed_at: None,
            application_id: None,
            created_at: now,
            updated_at: now,
        };
        reminder.apply(patch, now)?;
        Ok(reminder)
    }

    pub fn apply(&mut self, patch: ReminderPatch, now: DateTime<Utc>) -> Result<(), AppError> {
        if let Some(title) = patch.title {
            self.title = non_blank(title, "title")?;
        }
        merge(&mut self.description, patch.description);
        merge(&mut self.due_date, patch.due_date);
        merge(&mut self.kind, patch.kind);
        merge(&mut self.is_completed, patch.is_completed);
        merge(&mut self.completed_at, patch.completed_at);
        merge(&mut self.application_id, patch.application_id);
        self.updated_at = now;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderPatch {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "date")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(rename = "type")]
    pub kind: Option<ReminderType>,
    pub is_completed: Option<bool>,
    #[serde(default, deserialize_with = "nullable_date")]
    pub completed_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable")]
    pub application_id: Option<Option<Uuid>>,
}

impl Entity for Reminder {
    const TABLE: Table = Table::Reminders;
    const ORDER: &'static [Order] = &[Order::asc(Self::DUE_DATE)];

    fn id(&self) -> Uuid {
        self.id
    }

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("id", self.id.into()),
            ("title", self.title.clone().into()),
            ("description", self.description.clone().into()),
            ("due_date", self.due_date.into()),
            ("kind", self.kind.into()),
            ("is_completed", self.is_completed.into()),
            ("completed_at", self.completed_at.into()),
            ("application_id", self.application_id.into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
        ]
    }
}

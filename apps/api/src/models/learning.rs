use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{merge, non_blank, required_text};
use crate::payload::{nullable, nullable_date};
use crate::store::{Entity, Field, Order, SqlValue, Table, CREATED_AT};

text_enum!(LearningType {
    Concept => "CONCEPT",
    Skill => "SKILL",
    Tool => "TOOL",
    Language => "LANGUAGE",
    Framework => "FRAMEWORK",
    Book => "BOOK",
    Course => "COURSE",
    Other => "OTHER",
});

text_enum!(LearningStatus {
    ToLearn => "TO_LEARN",
    InProgress => "IN_PROGRESS",
    Completed => "COMPLETED",
});

text_enum!(Priority {
    Low => "LOW",
    Medium => "MEDIUM",
    High => "HIGH",
});

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LearningItem {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: LearningType,
    pub status: LearningStatus,
    pub priority: Priority,
    /// Percent complete, 0–100.
    pub progress: i32,
    pub resource_url: Option<String>,
    pub notes: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LearningItem {
    pub const STATUS: Field = Field::new("status", "status");
    pub const KIND: Field = Field::new("kind", "type");

    pub fn create(patch: LearningItemPatch, now: DateTime<Utc>) -> Result<Self, AppError> {
        let mut item = LearningItem {
            id: Uuid::new_v4(),
            title: required_text(patch.title.clone(), "title")?,
            description: None,
            kind: LearningType::Concept,
            status: LearningStatus::ToLearn,
            priority: Priority::Medium,
            progress: 0,
            resource_url: None,
            notes: None,
            started_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        item.apply(patch, now)?;
        Ok(item)
    }

    pub fn apply(&mut self, patch: LearningItemPatch, now: DateTime<Utc>) -> Result<(), AppError> {
        if let Some(title) = patch.title {
            self.title = non_blank(title, "title")?;
        }
        merge(&mut self.description, patch.description);
        merge(&mut self.kind, patch.kind);
        merge(&mut self.status, patch.status);
        merge(&mut self.priority, patch.priority);
        merge(&mut self.progress, patch.progress);
        merge(&mut self.resource_url, patch.resource_url);
        merge(&mut self.notes, patch.notes);
        merge(&mut self.started_at, patch.started_at);
        merge(&mut self.completed_at, patch.completed_at);
        self.updated_at = now;

        if !(0..=100).contains(&self.progress) {
            return Err(AppError::Validation(
                "progress must be between 0 and 100".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningItemPatch {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(rename = "type")]
    pub kind: Option<LearningType>,
    pub status: Option<LearningStatus>,
    pub priority: Option<Priority>,
    pub progress: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    pub resource_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable_date")]
    pub started_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable_date")]
    pub completed_at: Option<Option<DateTime<Utc>>>,
}

impl Entity for LearningItem {
    const TABLE: Table = Table::LearningItems;
    const ORDER: &'static [Order] = &[Order::desc(CREATED_AT)];

    fn id(&self) -> Uuid {
        self.id
    }

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("id", self.id.into()),
            ("title", self.title.clone().into()),
            ("description", self.description.clone().into()),
            ("kind", self.kind.into()),
            ("status", self.status.into()),
            ("priority", self.priority.into()),
            ("progress", self.progress.into()),
            ("resource_url", self.resource_url.clone().into()),
            ("notes", self.notes.clone().into()),
            ("started_at", self.started_at.into()),
            ("completed_at", self.completed_at.into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
        ]
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{merge, non_blank, required_text};
use crate::payload::nullable;
use crate::store::{Entity, Field, Order, SqlValue, Table, CREATED_AT};

text_enum!(ResourceType {
    Article => "ARTICLE",
    Video => "VIDEO",
    Course => "COURSE",
    Book => "BOOK",
    Documentation => "DOCUMENTATION",
    Tool => "TOOL",
    Other => "OTHER",
});

/// A bookmarked study or prep resource. Sub-resources hang off `parent_id`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: Uuid,
    pub title: String,
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<ResourceType>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub parent_id: Option<Uuid>,
    pub is_completed: bool,
    pub is_favorite: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource {
    pub const PARENT_ID: Field = Field::new("parent_id", "parentId");
    pub const CATEGORY: Field = Field::new("category", "category");
    pub const IS_FAVORITE: Field = Field::new("is_favorite", "isFavorite");

    pub fn create(patch: ResourcePatch, now: DateTime<Utc>) -> Result<Self, AppError> {
        let mut resource = Resource {
            id: Uuid::new_v4(),
            title: required_text(patch.title.clone(), "title")?,
            url: None,
            kind: None,
            category: None,
            tags: Vec::new(),
            parent_id: None,
            is_completed: false,
            is_favorite: false,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        resource.apply(patch, now)?;
        Ok(resource)
    }

    pub fn apply(&mut self, patch: ResourcePatch, now: DateTime<Utc>) -> Result<(), AppError> {
        if let Some(title) = patch.title {
            self.title = non_blank(title, "title")?;
        }
        merge(&mut self.url, patch.url);
        merge(&mut self.kind, patch.kind);
        merge(&mut self.category, patch.category);
        merge(&mut self.tags, patch.tags);
        merge(&mut self.parent_id, patch.parent_id);
        merge(&mut self.is_completed, patch.is_completed);
        merge(&mut self.is_favorite, patch.is_favorite);
        merge(&mut self.notes, patch.notes);
        self.updated_at = now;

        if self.parent_id == Some(self.id) {
            return Err(AppError::Validation(
                "parentId cannot reference the resource itself".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcePatch {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub url: Option<Option<String>>,
    #[serde(default, rename = "type", deserialize_with = "nullable")]
    pub kind: Option<Option<ResourceType>>,
    #[serde(default, deserialize_with = "nullable")]
    pub category: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub parent_id: Option<Option<Uuid>>,
    pub is_completed: Option<bool>,
    pub is_favorite: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
}

impl Entity for Resource {
    const TABLE: Table = Table::Resources;
    const ORDER: &'static [Order] = &[Order::desc(CREATED_AT)];

    fn id(&self) -> Uuid {
        self.id
    }

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("id", self.id.into()),
            ("title", self.title.clone().into()),
            ("url", self.url.clone().into()),
            (
                "kind",
                SqlValue::Text(self.kind.map(|kind| kind.as_str().to_string())),
            ),
            ("category", self.category.clone().into()),
            ("tags", self.tags.clone().into()),
            ("parent_id", self.parent_id.into()),
            ("is_completed", self.is_completed.into()),
            ("is_favorite", self.is_favorite.into()),
            ("notes", self.notes.clone().into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
        ]
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::SORT_ORDER;
use crate::models::{merge, non_blank, required, required_text};
use crate::payload::nullable;
use crate::store::{Entity, Field, Order, SqlValue, Table};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ResumeTemplate {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResumeTemplate {
    pub const NAME: Field = Field::new("name", "name");

    pub fn create(patch: ResumeTemplatePatch, now: DateTime<Utc>) -> Result<Self, AppError> {
        let mut template = ResumeTemplate {
            id: Uuid::new_v4(),
            name: required_text(patch.name.clone(), "name")?,
            description: None,
            created_at: now,
            updated_at: now,
        };
        template.apply(patch, now)?;
        Ok(template)
    }

    pub fn apply(&mut self, patch: ResumeTemplatePatch, now: DateTime<Utc>) -> Result<(), AppError> {
        if let Some(name) = patch.name {
            self.name = non_blank(name, "name")?;
        }
        merge(&mut self.description, patch.description);
        self.updated_at = now;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeTemplatePatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
}

impl Entity for ResumeTemplate {
    const TABLE: Table = Table::ResumeTemplates;
    const ORDER: &'static [Order] = &[Order::asc(Self::NAME)];

    fn id(&self) -> Uuid {
        self.id
    }

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("id", self.id.into()),
            ("name", self.name.clone().into()),
            ("description", self.description.clone().into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
        ]
    }
}

/// A named block of a template. `name` is unique within its template.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ResumeSection {
    pub id: Uuid,
    pub template_id: Uuid,
    pub name: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_visible: bool,
    #[serde(rename = "order")]
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResumeSection {
    pub const TEMPLATE_ID: Field = Field::new("template_id", "templateId");
    pub const NAME: Field = Field::new("name", "name");

    pub fn create(patch: ResumeSectionPatch, now: DateTime<Utc>) -> Result<Self, AppError> {
        let mut section = ResumeSection {
            id: Uuid::new_v4(),
            template_id: required(patch.template_id, "templateId")?,
            name: required_text(patch.name.clone(), "name")?,
            title: None,
            content: None,
            is_visible: true,
            sort_order: 0,
            created_at: now,
            updated_at: now,
        };
        section.apply(patch, now)?;
        Ok(section)
    }

    pub fn apply(&mut self, patch: ResumeSectionPatch, now: DateTime<Utc>) -> Result<(), AppError> {
        merge(&mut self.template_id, patch.template_id);
        if let Some(name) = patch.name {
            self.name = non_blank(name, "name")?;
        }
        merge(&mut self.title, patch.title);
        merge(&mut self.content, patch.content);
        merge(&mut self.is_visible, patch.is_visible);
        merge(&mut self.sort_order, patch.sort_order);
        self.updated_at = now;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeSectionPatch {
    pub template_id: Option<Uuid>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub content: Option<Option<String>>,
    pub is_visible: Option<bool>,
    #[serde(rename = "order")]
    pub sort_order: Option<i32>,
}

impl Entity for ResumeSection {
    const TABLE: Table = Table::ResumeSections;
    const ORDER: &'static [Order] = &[Order::asc(SORT_ORDER)];
    const UNIQUE: &'static [&'static [Field]] = &[&[Self::TEMPLATE_ID, Self::NAME]];

    fn id(&self) -> Uuid {
        self.id
    }

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("id", self.id.into()),
            ("template_id", self.template_id.into()),
            ("name", self.name.clone().into()),
            ("title", self.title.clone().into()),
            ("content", self.content.clone().into()),
            ("is_visible", self.is_visible.into()),
            ("sort_order", self.sort_order.into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
        ]
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{merge, non_blank, required_text};
use crate::payload::nullable;
use crate::store::{Entity, Field, Order, SqlValue, Table};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub website: Option<String>,
    pub careers_url: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Company {
    pub const NAME: Field = Field::new("name", "name");

    pub fn create(patch: CompanyPatch, now: DateTime<Utc>) -> Result<Self, AppError> {
        let mut company = Company {
            id: Uuid::new_v4(),
            name: required_text(patch.name.clone(), "name")?,
            website: None,
            careers_url: None,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        company.apply(patch, now)?;
        Ok(company)
    }

    pub fn apply(&mut self, patch: CompanyPatch, now: DateTime<Utc>) -> Result<(), AppError> {
        if let Some(name) = patch.name {
            self.name = non_blank(name, "name")?;
        }
        merge(&mut self.website, patch.website);
        merge(&mut self.careers_url, patch.careers_url);
        merge(&mut self.notes, patch.notes);
        self.updated_at = now;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub website: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub careers_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
}

impl Entity for Company {
    const TABLE: Table = Table::Companies;
    const ORDER: &'static [Order] = &[Order::asc(Self::NAME)];

    fn id(&self) -> Uuid {
        self.id
    }

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("id", self.id.into()),
            ("name", self.name.clone().into()),
            ("website", self.website.clone().into()),
            ("careers_url", self.careers_url.clone().into()),
            ("notes", self.notes.clone().into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
        ]
    }
}

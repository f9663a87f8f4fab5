use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{merge, non_blank, required_text};
use crate::store::{Entity, Field, Order, SqlValue, Table};

text_enum!(EmailCategory {
    ColdOutreach => "COLD_OUTREACH",
    ReferralRequest => "REFERRAL_REQUEST",
    FollowUp => "FOLLOW_UP",
    ThankYou => "THANK_YOU",
    Networking => "NETWORKING",
    Other => "OTHER",
});

/// Reusable outreach copy. Static content, nothing derived.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EmailTemplate {
    pub id: Uuid,
    pub name: String,
    pub subject: String,
    pub body: String,
    pub category: EmailCategory,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EmailTemplate {
    pub const NAME: Field = Field::new("name", "name");
    pub const CATEGORY: Field = Field::new("category", "category");

    pub fn create(patch: EmailTemplatePatch, now: DateTime<Utc>) -> Result<Self, AppError> {
        let mut template = EmailTemplate {
            id: Uuid::new_v4(),
            name: required_text(patch.name.clone(), "name")?,
            subject: required_text(patch.subject.clone(), "subject")?,
            body: required_text(patch.body.clone(), "body")?,
            category: EmailCategory::Other,
            created_at: now,
            updated_at: now,
        };
        template.apply(patch, now)?;
        Ok(template)
    }

    pub fn apply(&mut self, patch: EmailTemplatePatch, now: DateTime<Utc>) -> Result<(), AppError> {
        if let Some(name) = patch.name {
            self.name = non_blank(name, "name")?;
        }
        if let Some(subject) = patch.subject {
            self.subject = non_blank(subject, "subject")?;
        }
        if let Some(body) = patch.body {
            self.body = non_blank(body, "body")?;
        }
        merge(&mut self.category, patch.category);
        self.updated_at = now;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailTemplatePatch {
    pub name: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub category: Option<EmailCategory>,
}

impl Entity for EmailTemplate {
    const TABLE: Table = Table::EmailTemplates;
    const ORDER: &'static [Order] = &[Order::asc(Self::NAME)];

    fn id(&self) -> Uuid {
        self.id
    }

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("id", self.id.into()),
            ("name", self.name.clone().into()),
            ("subject", self.subject.clone().into()),
            ("body", self.body.clone().into()),
            ("category", self.category.into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
        ]
    }
}

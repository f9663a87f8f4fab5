use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{merge, non_blank, required, required_text};
use crate::payload::{nullable, nullable_date};
use crate::store::{Entity, Field, Order, SqlValue, Table, CREATED_AT};

text_enum!(
    /// Where an outreach conversation with a contact stands.
    ContactStatus {
        NotContacted => "NOT_CONTACTED",
        RequestSent => "REQUEST_SENT",
        Connected => "CONNECTED",
        Messaged => "MESSAGED",
        Replied => "REPLIED",
        MeetingScheduled => "MEETING_SCHEDULED",
        NoResponse => "NO_RESPONSE",
    }
);

impl ContactStatus {
    /// Statuses that imply a message has gone out.
    pub fn implies_messaged(self) -> bool {
        matches!(
            self,
            ContactStatus::Messaged | ContactStatus::Replied | ContactStatus::MeetingScheduled
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub linkedin_url: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub status: ContactStatus,
    pub can_refer: bool,
    pub messaged_date: Option<DateTime<Utc>>,
    pub last_interaction_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contact {
    pub const COMPANY_ID: Field = Field::new("company_id", "companyId");
    pub const CAN_REFER: Field = Field::new("can_refer", "canRefer");

    pub fn create(patch: ContactPatch, now: DateTime<Utc>) -> Result<Self, AppError> {
        let mut contact = Contact {
            id: Uuid::new_v4(),
            company_id: required(patch.company_id, "companyId")?,
            name: required_text(patch.name.clone(), "name")?,
            linkedin_url: None,
            email: None,
            phone: None,
            position: None,
            status: ContactStatus::NotContacted,
            can_refer: false,
            messaged_date: None,
            last_interaction_date: None,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        contact.apply(patch, now)?;
        Ok(contact)
    }

    pub fn apply(&mut self, patch: ContactPatch, now: DateTime<Utc>) -> Result<(), AppError> {
        merge(&mut self.company_id, patch.company_id);
        if let Some(name) = patch.name {
            self.name = non_blank(name, "name")?;
        }
        merge(&mut self.linkedin_url, patch.linkedin_url);
        merge(&mut self.email, patch.email);
        merge(&mut self.phone, patch.phone);
        merge(&mut self.position, patch.position);
        merge(&mut self.status, patch.status);
        merge(&mut self.can_refer, patch.can_refer);
        merge(&mut self.messaged_date, patch.messaged_date);
        merge(&mut self.last_interaction_date, patch.last_interaction_date);
        merge(&mut self.notes, patch.notes);
        self.updated_at = now;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPatch {
    pub company_id: Option<Uuid>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub linkedin_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub position: Option<Option<String>>,
    pub status: Option<ContactStatus>,
    pub can_refer: Option<bool>,
    #[serde(default, deserialize_with = "nullable_date")]
    pub messaged_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable_date")]
    pub last_interaction_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
}

impl Entity for Contact {
    const TABLE: Table = Table::Contacts;
    const ORDER: &'static [Order] = &[Order::desc(CREATED_AT)];

    fn id(&self) -> Uuid {
        self.id
    }

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("id", self.id.into()),
            ("company_id", self.company_id.into()),
            ("name", self.name.clone().into()),
            ("linkedin_url", self.linkedin_url.clone().into()),
            ("email", self.email.clone().into()),
            ("phone", self.phone.clone().into()),
            ("position", self.position.clone().into()),
            ("status", self.status.into()),
            ("can_refer", self.can_refer.into()),
            ("messaged_date", self.messaged_date.into()),
            ("last_interaction_date", self.last_interaction_date.into()),
            ("notes", self.notes.clone().into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
        ]
    }
}

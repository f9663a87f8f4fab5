use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::consistency::{self, ensure_exists};
use crate::derivation;
use crate::errors::AppError;
use crate::filters::ContactFilter;
use crate::models::company::Company;
use crate::models::contact::{Contact, ContactPatch};
use crate::services::{fetch, load_by_ids};
use crate::store::{Store, Table};

#[derive(Debug, Serialize)]
pub struct ContactView {
    #[serde(flatten)]
    pub contact: Contact,
    pub company: Option<Company>,
}

async fn with_company(store: &Store, contacts: Vec<Contact>) -> Result<Vec<ContactView>, AppError> {
    let companies = load_by_ids::<Company>(store, contacts.iter().map(|c| Some(c.company_id))).await?;
    Ok(contacts
        .into_iter()
        .map(|contact| ContactView {
            company: companies.get(&contact.company_id).cloned(),
            contact,
        })
        .collect())
}

async fn view(store: &Store, contact: Contact) -> Result<ContactView, AppError> {
    let company = store.get(contact.company_id).await?;
    Ok(ContactView { contact, company })
}

pub async fn list(store: &Store, filter: &ContactFilter) -> Result<Vec<ContactView>, AppError> {
    let contacts = store.list(&filter.query()).await?;
    with_company(store, contacts).await
}

pub async fn get(store: &Store, id: Uuid) -> Result<ContactView, AppError> {
    let contact = fetch(store, id).await?;
    view(store, contact).await
}

pub async fn create(store: &Store, patch: ContactPatch) -> Result<ContactView, AppError> {
    let now = Utc::now();
    let contact = Contact::create(derivation::contact(patch, now), now)?;
    ensure_exists(store, Table::Companies, contact.company_id, "companyId").await?;

    store.insert(&contact).await?;
    info!("Created contact {} at company {}", contact.id, contact.company_id);
    view(store, contact).await
}

pub async fn update(store: &Store, id: Uuid, patch: ContactPatch) -> Result<ContactView, AppError> {
    let now = Utc::now();
    let patch = derivation::contact(patch, now);
    if let Some(company_id) = patch.company_id {
        ensure_exists(store, Table::Companies, company_id, "companyId").await?;
    }

    let mut contact: Contact = fetch(store, id).await?;
    contact.apply(patch, now)?;
    if !store.update(&contact).await? {
        return Err(AppError::not_found("contact", id));
    }
    view(store, contact).await
}

/// Applications they referred keep their row; `referredById` is cleared.
pub async fn delete(store: &Store, id: Uuid) -> Result<(), AppError> {
    consistency::delete(store, Table::Contacts, id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::company::CompanyPatch;
    use crate::models::contact::ContactStatus;
    use crate::services::companies;

    async fn company(store: &Store) -> Company {
        companies::create(
            store,
            CompanyPatch {
                name: Some("Acme".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }

    fn contact(company_id: Uuid, name: &str, can_refer: bool) -> ContactPatch {
        ContactPatch {
            company_id: Some(company_id),
            name: Some(name.into()),
            can_refer: Some(can_refer),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_messaged_status_stamps_date() {
        let store = Store::in_memory();
        let acme = company(&store).await;
        let created = create(&store, contact(acme.id, "Dana", false)).await.unwrap();
        assert!(created.contact.messaged_date.is_none());
        assert_eq!(created.company.as_ref().map(|c| c.id), Some(acme.id));

        let updated = update(
            &store,
            created.contact.id,
            ContactPatch {
                status: Some(ContactStatus::Messaged),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(updated.contact.messaged_date.is_some());
    }

    #[tokio::test]
    async fn test_can_refer_filter_only_applies_when_true() {
        let store = Store::in_memory();
        let acme = company(&store).await;
        create(&store, contact(acme.id, "Dana", true)).await.unwrap();
        create(&store, contact(acme.id, "Eli", false)).await.unwrap();

        let referrers = ContactFilter {
            can_refer: Some(true),
            ..Default::default()
        };
        let found = list(&store, &referrers).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].contact.name, "Dana");

        let everyone = ContactFilter {
            can_refer: Some(false),
            ..Default::default()
        };
        assert_eq!(list(&store, &everyone).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_company_rejected() {
        let store = Store::in_memory();
        let err = create(&store, contact(Uuid::new_v4(), "Dana", false))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref msg) if msg.contains("companyId")));
    }
}

use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::consistency::{self, ensure_exists};
use crate::errors::AppError;
use crate::filters::SectionFilter;
use crate::models::resume_template::{
    ResumeSection, ResumeSectionPatch, ResumeTemplate, ResumeTemplatePatch,
};
use crate::services::fetch;
use crate::store::{Query, Store, Table};

#[derive(Debug, Serialize)]
pub struct TemplateDetail {
    #[serde(flatten)]
    pub template: ResumeTemplate,
    pub sections: Vec<ResumeSection>,
}

pub async fn list(store: &Store) -> Result<Vec<ResumeTemplate>, AppError> {
    Ok(store.list(&Query::new()).await?)
}

pub async fn get(store: &Store, id: Uuid) -> Result<TemplateDetail, AppError> {
    let template = fetch(store, id).await?;
    let sections = store
        .list(&Query::new().eq(ResumeSection::TEMPLATE_ID, id))
        .await?;
    Ok(TemplateDetail { template, sections })
}

pub async fn create(store: &Store, patch: ResumeTemplatePatch) -> Result<ResumeTemplate, AppError> {
    let template = ResumeTemplate::create(patch, Utc::now())?;
    store.insert(&template).await?;
    info!("Created resume template {} ({})", template.id, template.name);
    Ok(template)
}

pub async fn update(
    store: &Store,
    id: Uuid,
    patch: ResumeTemplatePatch,
) -> Result<ResumeTemplate, AppError> {
    let mut template: ResumeTemplate = fetch(store, id).await?;
    template.apply(patch, Utc::now())?;
    if !store.update(&template).await? {
        return Err(AppError::not_found("resume template", id));
    }
    Ok(template)
}

/// Sections go with the template.
pub async fn delete(store: &Store, id: Uuid) -> Result<(), AppError> {
    consistency::delete(store, Table::ResumeTemplates, id).await
}

// ────────────────────────────────────────────────────────────────────────────
// Sections
// ────────────────────────────────────────────────────────────────────────────

/// Rejects a section whose name is already taken within its template.
/// The store enforces the same constraint; this check names the clash.
async fn ensure_unique_name(store: &Store, section: &ResumeSection) -> Result<(), AppError> {
    let same_name: Vec<ResumeSection> = store
        .list(
            &Query::new()
                .eq(ResumeSection::TEMPLATE_ID, section.template_id)
                .eq(ResumeSection::NAME, section.name.clone()),
        )
        .await?;
    if same_name.iter().any(|other| other.id != section.id) {
        return Err(AppError::Validation(format!(
            "A section named '{}' already exists in this template (templateId, name must be unique)",
            section.name
        )));
    }
    Ok(())
}

pub async fn list_sections(
    store: &Store,
    filter: &SectionFilter,
) -> Result<Vec<ResumeSection>, AppError> {
    Ok(store.list(&filter.query()).await?)
}

pub async fn get_section(store: &Store, id: Uuid) -> Result<ResumeSection, AppError> {
    fetch(store, id).await
}

pub async fn create_section(
    store: &Store,
    patch: ResumeSectionPatch,
) -> Result<ResumeSection, AppError> {
    let section = ResumeSection::create(patch, Utc::now())?;
    ensure_exists(store, Table::ResumeTemplates, section.template_id, "templateId").await?;
    ensure_unique_name(store, &section).await?;

    store.insert(&section).await?;
    info!(
        "Created section '{}' on template {}",
        section.name, section.template_id
    );
    Ok(section)
}

pub async fn update_section(
    store: &Store,
    id: Uuid,
    patch: ResumeSectionPatch,
) -> Result<ResumeSection, AppError> {
    if let Some(template_id) = patch.template_id {
        ensure_exists(store, Table::ResumeTemplates, template_id, "templateId").await?;
    }

    let mut section: ResumeSection = fetch(store, id).await?;
    section.apply(patch, Utc::now())?;
    ensure_unique_name(store, &section).await?;
    if !store.update(&section).await? {
        return Err(AppError::not_found("resume section", id));
    }
    Ok(section)
}

pub async fn delete_section(store: &Store, id: Uuid) -> Result<(), AppError> {
    consistency::delete(store, Table::ResumeSections, id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn template(store: &Store, name: &str) -> ResumeTemplate {
        create(
            store,
            ResumeTemplatePatch {
                name: Some(name.into()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }

    fn named(template_id: Uuid, name: &str) -> ResumeSectionPatch {
        ResumeSectionPatch {
            template_id: Some(template_id),
            name: Some(name.into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_section_name_unique_per_template() {
        let store = Store::in_memory();
        let classic = template(&store, "Classic").await;
        let modern = template(&store, "Modern").await;

        let first = create_section(&store, named(classic.id, "summary")).await.unwrap();
        assert!(first.is_visible);

        let err = create_section(&store, named(classic.id, "summary"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref msg) if msg.contains("unique")));

        create_section(&store, named(modern.id, "summary")).await.unwrap();

        let filter = SectionFilter {
            template_id: Some(classic.id),
        };
        assert_eq!(list_sections(&store, &filter).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rename_into_collision_rejected() {
        let store = Store::in_memory();
        let classic = template(&store, "Classic").await;
        create_section(&store, named(classic.id, "summary")).await.unwrap();
        let skills = create_section(&store, named(classic.id, "skills")).await.unwrap();

        let err = update_section(
            &store,
            skills.id,
            ResumeSectionPatch {
                name: Some("summary".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // Saving a section under its own name is not a clash.
        update_section(
            &store,
            skills.id,
            ResumeSectionPatch {
                name: Some("skills".into()),
                is_visible: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_deleting_template_removes_sections() {
        let store = Store::in_memory();
        let classic = template(&store, "Classic").await;
        let section = create_section(&store, named(classic.id, "summary")).await.unwrap();

        let detail = get(&store, classic.id).await.unwrap();
        assert_eq!(detail.sections.len(), 1);

        delete(&store, classic.id).await.unwrap();
        assert!(matches!(
            get_section(&store, section.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}

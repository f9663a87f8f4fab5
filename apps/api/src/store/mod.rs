//! Entity store.
//!
//! Two interchangeable backends sit behind [`Store`]: Postgres (via sqlx) when
//! `DATABASE_URL` is configured, and an in-memory map otherwise. Both speak the
//! same small vocabulary: typed rows implementing [`Entity`], a [`Query`] made of
//! [`Predicate`]s, and a delete that walks a caller-supplied [`Relation`] table
//! so cascades run atomically with the parent delete.

pub mod memory;
pub mod postgres;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::PgStore;

// ────────────────────────────────────────────────────────────────────────────
// Schema vocabulary
// ────────────────────────────────────────────────────────────────────────────

/// A persisted attribute, addressed by its SQL column and its JSON key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub column: &'static str,
    pub key: &'static str,
}

impl Field {
    pub const fn new(column: &'static str, key: &'static str) -> Self {
        Self { column, key }
    }
}

pub const ID: Field = Field::new("id", "id");
pub const CREATED_AT: Field = Field::new("created_at", "createdAt");
pub const UPDATED_AT: Field = Field::new("updated_at", "updatedAt");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Companies,
    Contacts,
    Applications,
    Interviews,
    Reminders,
    Tasks,
    Events,
    Resources,
    LearningItems,
    EmailTemplates,
    Resumes,
    Experiences,
    Projects,
    SkillCategories,
    Educations,
    ResumeTemplates,
    ResumeSections,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::Companies => "companies",
            Table::Contacts => "contacts",
            Table::Applications => "applications",
            Table::Interviews => "interviews",
            Table::Reminders => "reminders",
            Table::Tasks => "tasks",
            Table::Events => "events",
            Table::Resources => "resources",
            Table::LearningItems => "learning_items",
            Table::EmailTemplates => "email_templates",
            Table::Resumes => "resumes",
            Table::Experiences => "experiences",
            Table::Projects => "projects",
            Table::SkillCategories => "skill_categories",
            Table::Educations => "educations",
            Table::ResumeTemplates => "resume_templates",
            Table::ResumeSections => "resume_sections",
        }
    }

    /// Human-readable singular, used in error messages.
    pub fn label(self) -> &'static str {
        match self {
            Table::Companies => "company",
            Table::Contacts => "contact",
            Table::Applications => "application",
            Table::Interviews => "interview",
            Table::Reminders => "reminder",
            Table::Tasks => "task",
            Table::Events => "event",
            Table::Resources => "resource",
            Table::LearningItems => "learning item",
            Table::EmailTemplates => "email template",
            Table::Resumes => "resume",
            Table::Experiences => "experience",
            Table::Projects => "project",
            Table::SkillCategories => "skill category",
            Table::Educations => "education",
            Table::ResumeTemplates => "resume template",
            Table::ResumeSections => "resume section",
        }
    }
}

/// A value bound into a SQL statement or compared against a stored row.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Uuid(Option<Uuid>),
    Text(Option<String>),
    Int(Option<i32>),
    Float(Option<f64>),
    Bool(bool),
    Timestamp(Option<DateTime<Utc>>),
    TextArray(Vec<String>),
}

impl SqlValue {
    /// The JSON shape serde produces for the same value inside an entity.
    pub fn to_json(&self) -> Value {
        match self {
            SqlValue::Uuid(v) => v.map_or(Value::Null, |id| Value::String(id.to_string())),
            SqlValue::Text(v) => v.clone().map_or(Value::Null, Value::String),
            SqlValue::Int(v) => v.map_or(Value::Null, Value::from),
            SqlValue::Float(v) => v.map_or(Value::Null, Value::from),
            SqlValue::Bool(v) => Value::Bool(*v),
            SqlValue::Timestamp(v) => v.map_or(Value::Null, |ts| {
                Value::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }),
            SqlValue::TextArray(v) => Value::from(v.clone()),
        }
    }
}

macro_rules! sql_value_from {
    ($variant:ident, $ty:ty) => {
        impl From<$ty> for SqlValue {
            fn from(value: $ty) -> Self {
                SqlValue::$variant(Some(value))
            }
        }

        impl From<Option<$ty>> for SqlValue {
            fn from(value: Option<$ty>) -> Self {
                SqlValue::$variant(value)
            }
        }
    };
}

sql_value_from!(Uuid, Uuid);
sql_value_from!(Text, String);
sql_value_from!(Int, i32);
sql_value_from!(Float, f64);
sql_value_from!(Timestamp, DateTime<Utc>);

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<Vec<String>> for SqlValue {
    fn from(value: Vec<String>) -> Self {
        SqlValue::TextArray(value)
    }
}

/// A persisted row type.
pub trait Entity:
    Serialize + DeserializeOwned + for<'r> FromRow<'r, PgRow> + Clone + Send + Sync + Unpin + 'static
{
    const TABLE: Table;
    /// Default list order. Creation time then id are always appended as tie-breakers.
    const ORDER: &'static [Order];
    /// Column groups that must be unique together.
    const UNIQUE: &'static [&'static [Field]] = &[];

    fn id(&self) -> Uuid;

    /// Every persisted column with its current value, `id` first.
    fn columns(&self) -> Vec<(&'static str, SqlValue)>;
}

// ────────────────────────────────────────────────────────────────────────────
// Queries
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq(Field, SqlValue),
    IsNull(Field),
    In(Field, Vec<Uuid>),
    /// Inclusive on both ends.
    Between(Field, DateTime<Utc>, DateTime<Utc>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub predicates: Vec<Predicate>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: Field, value: impl Into<SqlValue>) -> Self {
        self.predicates.push(Predicate::Eq(field, value.into()));
        self
    }

    pub fn is_null(mut self, field: Field) -> Self {
        self.predicates.push(Predicate::IsNull(field));
        self
    }

    pub fn one_of(mut self, field: Field, ids: Vec<Uuid>) -> Self {
        self.predicates.push(Predicate::In(field, ids));
        self
    }

    pub fn between(mut self, field: Field, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.predicates.push(Predicate::Between(field, from, to));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub field: Field,
    pub descending: bool,
}

impl Order {
    pub const fn asc(field: Field) -> Self {
        Self {
            field,
            descending: false,
        }
    }

    pub const fn desc(field: Field) -> Self {
        Self {
            field,
            descending: true,
        }
    }
}

/// Orders applied after an entity's own default order.
pub const TIE_BREAKERS: [Order; 2] = [Order::asc(CREATED_AT), Order::asc(ID)];

// ────────────────────────────────────────────────────────────────────────────
// Delete policy
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    /// Children are deleted with the parent.
    Cascade,
    /// The child's foreign key is set to null.
    Nullify,
    /// The delete is rejected while children exist.
    Restrict,
}

/// A foreign key from `child.fk` to `parent.id`.
#[derive(Debug, Clone, Copy)]
pub struct Relation {
    pub parent: Table,
    pub child: Table,
    pub fk: Field,
    pub on_delete: OnDelete,
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("Cannot delete {parent} while {child} records reference it")]
    Restricted {
        parent: &'static str,
        child: &'static str,
    },

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            let detail = db_err
                .constraint()
                .map(str::to_string)
                .unwrap_or_else(|| db_err.message().to_string());
            match db_err.code().as_deref() {
                Some("23505") => return StoreError::UniqueViolation(detail),
                Some("23503") => return StoreError::ForeignKeyViolation(detail),
                _ => {}
            }
        }
        StoreError::Database(err)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Backend dispatch
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub enum Store {
    Postgres(PgStore),
    Memory(MemoryStore),
}

impl Store {
    pub fn in_memory() -> Self {
        Store::Memory(MemoryStore::new())
    }

    pub fn backend(&self) -> &'static str {
        match self {
            Store::Postgres(_) => "postgres",
            Store::Memory(_) => "memory",
        }
    }

    pub async fn list<E: Entity>(&self, query: &Query) -> Result<Vec<E>, StoreError> {
        match self {
            Store::Postgres(pg) => pg.list(query).await,
            Store::Memory(mem) => mem.list(query),
        }
    }

    pub async fn get<E: Entity>(&self, id: Uuid) -> Result<Option<E>, StoreError> {
        match self {
            Store::Postgres(pg) => pg.get(id).await,
            Store::Memory(mem) => mem.get(id),
        }
    }

    pub async fn exists(&self, table: Table, id: Uuid) -> Result<bool, StoreError> {
        match self {
            Store::Postgres(pg) => pg.exists(table, id).await,
            Store::Memory(mem) => Ok(mem.exists(table, id)),
        }
    }

    pub async fn insert<E: Entity>(&self, row: &E) -> Result<(), StoreError> {
        match self {
            Store::Postgres(pg) => pg.insert(row).await,
            Store::Memory(mem) => mem.insert(row),
        }
    }

    /// Overwrites the stored row. Returns `false` when no row has that id.
    pub async fn update<E: Entity>(&self, row: &E) -> Result<bool, StoreError> {
        match self {
            Store::Postgres(pg) => pg.update(row).await,
            Store::Memory(mem) => mem.update(row),
        }
    }

    /// Deletes a row and applies `relations` to its dependents in one atomic step.
    /// Returns `false` when no row has that id.
    pub async fn delete(
        &self,
        table: Table,
        id: Uuid,
        relations: &[Relation],
    ) -> Result<bool, StoreError> {
        match self {
            Store::Postgres(pg) => pg.delete(table, id, relations).await,
            Store::Memory(mem) => mem.delete(table, id, relations),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_value_json_matches_serde() {
        let id = Uuid::new_v4();
        assert_eq!(SqlValue::from(id).to_json(), serde_json::to_value(id).unwrap());
        assert_eq!(SqlValue::from(Some(7i32)).to_json(), serde_json::json!(7));
        assert_eq!(SqlValue::Text(None).to_json(), Value::Null);
        assert_eq!(SqlValue::from(true).to_json(), Value::Bool(true));
    }

    #[test]
    fn test_query_builder_accumulates() {
        let query = Query::new()
            .eq(Field::new("status", "status"), "APPLIED".to_string())
            .is_null(Field::new("parent_id", "parentId"));
        assert_eq!(query.predicates.len(), 2);
        assert!(matches!(query.predicates[1], Predicate::IsNull(_)));
    }
}

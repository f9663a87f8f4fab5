//! In-memory store backend.
//!
//! Rows are kept as the JSON serde produces for each entity, one map per table,
//! behind a single `parking_lot::RwLock`. The lock is never held across an
//! `.await`, and every write (including a whole cascade) happens under one
//! write guard, so each operation is atomic with respect to the others.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use uuid::Uuid;

use super::{Entity, OnDelete, Order, Predicate, Query, Relation, StoreError, Table, TIE_BREAKERS};

type Rows = HashMap<Uuid, Value>;

static NULL: Value = Value::Null;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<HashMap<Table, Rows>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list<E: Entity>(&self, query: &Query) -> Result<Vec<E>, StoreError> {
        let tables = self.tables.read();
        let Some(rows) = tables.get(&E::TABLE) else {
            return Ok(Vec::new());
        };

        let mut matching: Vec<&Value> = rows
            .values()
            .filter(|row| query.predicates.iter().all(|p| satisfies(row, p)))
            .collect();
        matching.sort_by(|a, b| compare_rows(a, b, E::ORDER));

        matching.into_iter().map(decode::<E>).collect()
    }

    pub fn get<E: Entity>(&self, id: Uuid) -> Result<Option<E>, StoreError> {
        let tables = self.tables.read();
        tables
            .get(&E::TABLE)
            .and_then(|rows| rows.get(&id))
            .map(decode::<E>)
            .transpose()
    }

    pub fn exists(&self, table: Table, id: Uuid) -> bool {
        self.tables
            .read()
            .get(&table)
            .is_some_and(|rows| rows.contains_key(&id))
    }

    pub fn insert<E: Entity>(&self, row: &E) -> Result<(), StoreError> {
        let value = encode(row)?;
        let mut tables = self.tables.write();
        let rows = tables.entry(E::TABLE).or_default();
        if rows.contains_key(&row.id()) {
            return Err(StoreError::UniqueViolation(format!(
                "{}.id {}",
                E::TABLE.name(),
                row.id()
            )));
        }
        check_unique::<E>(rows, row.id(), &value)?;
        rows.insert(row.id(), value);
        Ok(())
    }

    pub fn update<E: Entity>(&self, row: &E) -> Result<bool, StoreError> {
        let value = encode(row)?;
        let mut tables = self.tables.write();
        let Some(rows) = tables.get_mut(&E::TABLE) else {
            return Ok(false);
        };
        if !rows.contains_key(&row.id()) {
            return Ok(false);
        }
        check_unique::<E>(rows, row.id(), &value)?;
        rows.insert(row.id(), value);
        Ok(true)
    }

    pub fn delete(
        &self,
        table: Table,
        id: Uuid,
        relations: &[Relation],
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables.write();
        if !tables.get(&table).is_some_and(|rows| rows.contains_key(&id)) {
            return Ok(false);
        }

        // Plan the whole cascade before touching anything so a restrict
        // failure leaves every table as it was.
        let mut pending = vec![(table, id)];
        let mut doomed = Vec::new();
        let mut nullify = Vec::new();
        while let Some((table, id)) = pending.pop() {
            for relation in relations.iter().filter(|r| r.parent == table) {
                let children = child_ids(&tables, relation, id);
                match relation.on_delete {
                    OnDelete::Cascade => {
                        pending.extend(children.into_iter().map(|child| (relation.child, child)))
                    }
                    OnDelete::Nullify => nullify.extend(
                        children.into_iter().map(|child| (relation.child, child, relation.fk)),
                    ),
                    OnDelete::Restrict if !children.is_empty() => {
                        return Err(StoreError::Restricted {
                            parent: relation.parent.label(),
                            child: relation.child.label(),
                        });
                    }
                    OnDelete::Restrict => {}
                }
            }
            doomed.push((table, id));
        }

        for (table, child, fk) in nullify {
            if let Some(Value::Object(row)) =
                tables.get_mut(&table).and_then(|rows| rows.get_mut(&child))
            {
                row.insert(fk.key.to_string(), Value::Null);
            }
        }
        for (table, id) in doomed.iter().rev() {
            if let Some(rows) = tables.get_mut(table) {
                rows.remove(id);
            }
        }
        Ok(true)
    }
}

fn encode<E: Entity>(row: &E) -> Result<Value, StoreError> {
    serde_json::to_value(row).map_err(|e| StoreError::Corrupt(e.to_string()))
}

fn decode<E: Entity>(row: &Value) -> Result<E, StoreError> {
    serde_json::from_value(row.clone()).map_err(|e| StoreError::Corrupt(e.to_string()))
}

fn child_ids(tables: &HashMap<Table, Rows>, relation: &Relation, parent: Uuid) -> Vec<Uuid> {
    let parent = Value::String(parent.to_string());
    tables
        .get(&relation.child)
        .map(|rows| {
            rows.iter()
                .filter(|(_, row)| row.get(relation.fk.key) == Some(&parent))
                .map(|(id, _)| *id)
                .collect()
        })
        .unwrap_or_default()
}

fn check_unique<E: Entity>(rows: &Rows, id: Uuid, value: &Value) -> Result<(), StoreError> {
    for group in E::UNIQUE {
        let clash = rows.iter().any(|(other_id, other)| {
            *other_id != id
                && group
                    .iter()
                    .all(|field| other.get(field.key) == value.get(field.key))
        });
        if clash {
            let keys: Vec<&str> = group.iter().map(|f| f.key).collect();
            return Err(StoreError::UniqueViolation(format!(
                "{} ({})",
                E::TABLE.name(),
                keys.join(", ")
            )));
        }
    }
    Ok(())
}

fn satisfies(row: &Value, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::Eq(field, expected) => field_value(row, field.key) == &expected.to_json(),
        Predicate::IsNull(field) => field_value(row, field.key).is_null(),
        Predicate::In(field, ids) => match field_value(row, field.key) {
            Value::String(s) => ids.iter().any(|id| id.to_string() == *s),
            _ => false,
        },
        Predicate::Between(field, from, to) => {
            as_timestamp(field_value(row, field.key)).is_some_and(|ts| ts >= *from && ts <= *to)
        }
    }
}

fn field_value<'a>(row: &'a Value, key: &str) -> &'a Value {
    row.get(key).unwrap_or(&NULL)
}

fn as_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|ts| ts.with_timezone(&Utc))
}

fn compare_rows(a: &Value, b: &Value, order: &[Order]) -> Ordering {
    order
        .iter()
        .chain(TIE_BREAKERS.iter())
        .map(|o| {
            compare_values(
                field_value(a, o.field.key),
                field_value(b, o.field.key),
                o.descending,
            )
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Nulls sort last in either direction, matching `NULLS LAST` on Postgres.
fn compare_values(a: &Value, b: &Value, descending: bool) -> Ordering {
    let ordering = match (a, b) {
        (Value::Null, Value::Null) => return Ordering::Equal,
        (Value::Null, _) => return Ordering::Greater,
        (_, Value::Null) => return Ordering::Less,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::String(x), Value::String(y)) => match (as_timestamp(a), as_timestamp(b)) {
            (Some(left), Some(right)) => left.cmp(&right),
            _ => x.cmp(y),
        },
        _ => Ordering::Equal,
    };
    if descending {
        ordering.reverse()
    } else {
        ordering
    }
}

//! Postgres store backend.
//!
//! Statements are assembled with `sqlx::QueryBuilder` from the static table and
//! column names each [`Entity`] declares; every value goes through a bind
//! parameter.

use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use super::{Entity, OnDelete, Order, Predicate, Query, Relation, SqlValue, StoreError, Table, TIE_BREAKERS};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list<E: Entity>(&self, query: &Query) -> Result<Vec<E>, StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT * FROM {}", E::TABLE.name()));
        push_where(&mut qb, &query.predicates);
        push_order_by(&mut qb, E::ORDER);
        Ok(qb.build_query_as::<E>().fetch_all(&self.pool).await?)
    }

    pub async fn get<E: Entity>(&self, id: Uuid) -> Result<Option<E>, StoreError> {
        let sql = format!("SELECT * FROM {} WHERE id = $1", E::TABLE.name());
        Ok(sqlx::query_as::<_, E>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn exists(&self, table: Table, id: Uuid) -> Result<bool, StoreError> {
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)", table.name());
        Ok(sqlx::query_scalar::<_, bool>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?)
    }

    pub async fn insert<E: Entity>(&self, row: &E) -> Result<(), StoreError> {
        let columns = row.columns();
        let names: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();

        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "INSERT INTO {} ({}) VALUES (",
            E::TABLE.name(),
            names.join(", ")
        ));
        for (i, (_, value)) in columns.into_iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            push_value(&mut qb, value);
        }
        qb.push(")");

        qb.build().execute(&self.pool).await?;
        Ok(())
    }

    pub async fn update<E: Entity>(&self, row: &E) -> Result<bool, StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("UPDATE {} SET ", E::TABLE.name()));
        let assignments = row
            .columns()
            .into_iter()
            .filter(|(name, _)| *name != "id" && *name != "created_at");
        for (i, (name, value)) in assignments.enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(name).push(" = ");
            push_value(&mut qb, value);
        }
        qb.push(" WHERE id = ").push_bind(row.id());

        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(
        &self,
        table: Table,
        id: Uuid,
        relations: &[Relation],
    ) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)", table.name());
        let exists: bool = sqlx::query_scalar(&sql).bind(id).fetch_one(&mut *tx).await?;
        if !exists {
            return Ok(false);
        }

        // Any early return drops `tx`, which rolls the whole cascade back.
        let mut pending = vec![(table, id)];
        let mut doomed = Vec::new();
        while let Some((table, id)) = pending.pop() {
            for relation in relations.iter().filter(|r| r.parent == table) {
                let child = relation.child.name();
                let fk = relation.fk.column;
                match relation.on_delete {
                    OnDelete::Cascade => {
                        let sql = format!("SELECT id FROM {child} WHERE {fk} = $1");
                        let children: Vec<Uuid> =
                            sqlx::query_scalar(&sql).bind(id).fetch_all(&mut *tx).await?;
                        pending.extend(children.into_iter().map(|c| (relation.child, c)));
                    }
                    OnDelete::Nullify => {
                        let sql = format!("UPDATE {child} SET {fk} = NULL WHERE {fk} = $1");
                        sqlx::query(&sql).bind(id).execute(&mut *tx).await?;
                    }
                    OnDelete::Restrict => {
                        let sql = format!("SELECT EXISTS(SELECT 1 FROM {child} WHERE {fk} = $1)");
                        let referenced: bool =
                            sqlx::query_scalar(&sql).bind(id).fetch_one(&mut *tx).await?;
                        if referenced {
                            return Err(StoreError::Restricted {
                                parent: relation.parent.label(),
                                child: relation.child.label(),
                            });
                        }
                    }
                }
            }
            doomed.push((table, id));
        }

        for (table, id) in doomed.iter().rev() {
            let sql = format!("DELETE FROM {} WHERE id = $1", table.name());
            sqlx::query(&sql).bind(*id).execute(&mut *tx).await?;
        }
        tx.commit().await?;

        debug!("Deleted {} rows rooted at {} {id}", doomed.len(), table.name());
        Ok(true)
    }
}

fn push_value(qb: &mut QueryBuilder<'_, Postgres>, value: SqlValue) {
    match value {
        SqlValue::Uuid(v) => qb.push_bind(v),
        SqlValue::Text(v) => qb.push_bind(v),
        SqlValue::Int(v) => qb.push_bind(v),
        SqlValue::Float(v) => qb.push_bind(v),
        SqlValue::Bool(v) => qb.push_bind(v),
        SqlValue::Timestamp(v) => qb.push_bind(v),
        SqlValue::TextArray(v) => qb.push_bind(v),
    };
}

fn push_where(qb: &mut QueryBuilder<'_, Postgres>, predicates: &[Predicate]) {
    for (i, predicate) in predicates.iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        match predicate {
            Predicate::Eq(field, value) => {
                qb.push(field.column).push(" = ");
                push_value(qb, value.clone());
            }
            Predicate::IsNull(field) => {
                qb.push(field.column).push(" IS NULL");
            }
            Predicate::In(field, ids) => {
                qb.push(field.column).push(" = ANY(").push_bind(ids.clone()).push(")");
            }
            Predicate::Between(field, from, to) => {
                qb.push(field.column)
                    .push(" BETWEEN ")
                    .push_bind(*from)
                    .push(" AND ")
                    .push_bind(*to);
            }
        }
    }
}

fn push_order_by(qb: &mut QueryBuilder<'_, Postgres>, order: &[Order]) {
    qb.push(" ORDER BY ");
    let clauses: Vec<String> = order
        .iter()
        .chain(TIE_BREAKERS.iter())
        .map(|o| {
            let direction = if o.descending { "DESC" } else { "ASC" };
            format!("{} {direction} NULLS LAST", o.field.column)
        })
        .collect();
    qb.push(clauses.join(", "));
}

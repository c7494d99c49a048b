//! Generic CRUD over any catalogued entity. Statements come from the query store;
//! execution goes through a [`QueryRunner`].

use crate::error::{AppError, StoreError};
use crate::schema::{EntitySchema, FieldSpec};
use crate::service::pagination::Pagination;
use crate::service::runner::{GuardedDelete, NamedQuery, QueryRunner};
use crate::sql::{BindValue, QueryStore};
use serde_json::{Map, Value};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq)]
pub struct Page {
    pub items: Vec<Value>,
    /// Rows matching the filter across all pages.
    pub total: i64,
    pub pagination: Pagination,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

#[derive(Clone)]
pub struct Repository {
    runner: Arc<dyn QueryRunner>,
    queries: Arc<QueryStore>,
}

impl Repository {
    pub fn new(runner: Arc<dyn QueryRunner>, queries: Arc<QueryStore>) -> Self {
        Repository { runner, queries }
    }

    fn named(&self, entity: &EntitySchema, name: &'static str) -> Result<NamedQuery<'_>, AppError> {
        let sql = self.queries.get(name).map_err(|e| {
            tracing::error!(entity = entity.name, query = name, "query missing from store");
            AppError::from(e)
        })?;
        Ok(NamedQuery { name, sql })
    }

    /// One page plus the total count. `parent` filters on the entity's parent column;
    /// it is ignored for entities without one.
    pub async fn list(
        &self,
        entity: &EntitySchema,
        pagination: Pagination,
        parent: Option<BindValue>,
    ) -> Result<Page, AppError> {
        let mut params = Vec::with_capacity(3);
        if let Some(p) = entity.parent {
            params.push(parent.unwrap_or(BindValue::Null(p.kind)));
        }
        let total = self
            .runner
            .fetch_count(self.named(entity, entity.queries.count)?, &params)
            .await
            .map_err(failure(entity, "count", None))?;
        params.push(BindValue::Integer(pagination.limit as i64));
        params.push(BindValue::Integer(pagination.offset()));
        let items = self
            .runner
            .fetch_all(self.named(entity, entity.queries.list)?, &params)
            .await
            .map_err(failure(entity, "list", None))?;
        Ok(Page {
            items,
            total,
            pagination,
        })
    }

    pub async fn get(&self, entity: &EntitySchema, id: Uuid) -> Result<Option<Value>, AppError> {
        self.runner
            .fetch_optional(self.named(entity, entity.queries.get)?, &[BindValue::Uuid(id)])
            .await
            .map_err(failure(entity, "get", Some(id)))
    }

    /// Insert one row; omitted fields take their defaults or NULL. Returns the stored row.
    pub async fn create(&self, entity: &EntitySchema, body: &Map<String, Value>) -> Result<Value, AppError> {
        let params = entity
            .fields
            .iter()
            .map(|f| create_param(f, body))
            .collect::<Result<Vec<_>, _>>()?;
        let row = self
            .runner
            .fetch_optional(self.named(entity, entity.queries.create)?, &params)
            .await
            .map_err(failure(entity, "create", None))?
            .ok_or_else(|| {
                tracing::error!(entity = entity.name, "create returned no row");
                AppError::Db(sqlx::Error::RowNotFound)
            })?;
        tracing::info!(entity = entity.name, id = ?row.get(entity.id_column), "created");
        Ok(row)
    }

    /// Partial update: absent or null fields keep their stored value. `None` when the id does not exist.
    pub async fn update(
        &self,
        entity: &EntitySchema,
        id: Uuid,
        body: &Map<String, Value>,
    ) -> Result<Option<Value>, AppError> {
        let mut params = vec![BindValue::Uuid(id)];
        for f in entity.updatable_fields() {
            params.push(update_param(f, body)?);
        }
        let row = self
            .runner
            .fetch_optional(self.named(entity, entity.queries.update)?, &params)
            .await
            .map_err(failure(entity, "update", Some(id)))?;
        if row.is_some() {
            tracing::info!(entity = entity.name, %id, "updated");
        }
        Ok(row)
    }

    /// Delete unless dependent rows exist. Refusal leaves the row untouched.
    pub async fn delete(&self, entity: &EntitySchema, id: Uuid) -> Result<DeleteOutcome, AppError> {
        let checks = entity
            .dependents
            .iter()
            .map(|d| self.named(entity, d.query))
            .collect::<Result<Vec<_>, _>>()?;
        let delete = self.named(entity, entity.queries.delete)?;
        match self.runner.delete_guarded(&checks, delete, &BindValue::Uuid(id)).await {
            Ok(GuardedDelete::Deleted(0)) => Ok(DeleteOutcome::NotFound),
            Ok(GuardedDelete::Deleted(_)) => {
                tracing::info!(entity = entity.name, %id, "deleted");
                Ok(DeleteOutcome::Deleted)
            }
            Ok(GuardedDelete::Refused(counts)) => {
                let message = dependency_message(entity, &counts);
                tracing::warn!(entity = entity.name, %id, "{}", message);
                Err(AppError::Dependency(message))
            }
            // A reference added after the checks ran; the foreign key still protects the row.
            Err(StoreError::Constraint(detail)) => {
                tracing::warn!(entity = entity.name, %id, %detail, "delete blocked by constraint");
                Err(AppError::Dependency(format!(
                    "cannot delete {}: other records depend on it",
                    entity.label
                )))
            }
            Err(e) => Err(failure(entity, "delete", Some(id))(e)),
        }
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        self.runner.ping().await
    }
}

fn failure<'a>(
    entity: &'a EntitySchema,
    op: &'static str,
    id: Option<Uuid>,
) -> impl FnOnce(StoreError) -> AppError + 'a {
    move |e| match e {
        StoreError::Constraint(detail) => {
            tracing::warn!(entity = entity.name, op, id = ?id, %detail, "constraint violated");
            AppError::Conflict(format!("{} conflicts with existing data: {}", entity.label, detail))
        }
        StoreError::Db(err) => {
            tracing::error!(entity = entity.name, op, id = ?id, error = %err, "store call failed");
            AppError::Db(err)
        }
    }
}

fn coerce(field: &FieldSpec, v: &Value) -> Result<BindValue, AppError> {
    BindValue::coerce(field.kind, v)
        .ok_or_else(|| AppError::Validation(format!("{} must be {}", field.name, field.kind.describe())))
}

fn create_param(field: &FieldSpec, body: &Map<String, Value>) -> Result<BindValue, AppError> {
    match body.get(field.name).filter(|v| !v.is_null()) {
        Some(v) => coerce(field, v),
        None => Ok(field
            .default
            .map(BindValue::from_default)
            .unwrap_or(BindValue::Null(field.kind))),
    }
}

fn update_param(field: &FieldSpec, body: &Map<String, Value>) -> Result<BindValue, AppError> {
    match body.get(field.name) {
        Some(v) => coerce(field, v),
        None => Ok(BindValue::Null(field.kind)),
    }
}

/// `cannot delete stock category: 2 stock sub-categories and 1 stock items depend on it`
pub fn dependency_message(entity: &EntitySchema, counts: &[i64]) -> String {
    let parts: Vec<String> = entity
        .dependents
        .iter()
        .zip(counts)
        .filter(|(_, n)| **n > 0)
        .map(|(d, n)| format!("{} {}", n, d.label))
        .collect();
    format!("cannot delete {}: {} depend on it", entity.label, parts.join(" and "))
}

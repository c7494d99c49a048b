//! Execution seam between the repository and the database.

use crate::error::StoreError;
use crate::sql::BindValue;
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::{PgPool, PgRow, Postgres};
use sqlx::{Column, Decode, Row, Type, TypeInfo};

/// A statement resolved from the query store, kept with its name for logging.
#[derive(Clone, Copy, Debug)]
pub struct NamedQuery<'a> {
    pub name: &'a str,
    pub sql: &'a str,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardedDelete {
    /// One count per dependency check, in check order; at least one is non-zero.
    Refused(Vec<i64>),
    /// Rows removed by the delete statement (0 when the id did not exist).
    Deleted(u64),
}

/// Runs named statements with positional parameters and returns rows as JSON objects.
#[async_trait]
pub trait QueryRunner: Send + Sync {
    async fn fetch_optional(&self, query: NamedQuery<'_>, params: &[BindValue]) -> Result<Option<Value>, StoreError>;

    async fn fetch_all(&self, query: NamedQuery<'_>, params: &[BindValue]) -> Result<Vec<Value>, StoreError>;

    /// First column of the single row returned by a COUNT statement.
    async fn fetch_count(&self, query: NamedQuery<'_>, params: &[BindValue]) -> Result<i64, StoreError>;

    /// Run every check with `id` as `$1`; delete only when all counts are zero.
    /// Checks and delete share one transaction.
    async fn delete_guarded(
        &self,
        checks: &[NamedQuery<'_>],
        delete: NamedQuery<'_>,
        id: &BindValue,
    ) -> Result<GuardedDelete, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

pub struct PgRunner {
    pool: PgPool,
}

impl PgRunner {
    pub fn new(pool: PgPool) -> Self {
        PgRunner { pool }
    }
}

#[async_trait]
impl QueryRunner for PgRunner {
    async fn fetch_optional(&self, query: NamedQuery<'_>, params: &[BindValue]) -> Result<Option<Value>, StoreError> {
        tracing::debug!(query = query.name, params = params.len(), "fetch_optional");
        let mut q = sqlx::query(query.sql);
        for p in params {
            q = q.bind(p.clone());
        }
        let row = q.fetch_optional(&self.pool).await?;
        Ok(row.as_ref().map(row_to_json))
    }

    async fn fetch_all(&self, query: NamedQuery<'_>, params: &[BindValue]) -> Result<Vec<Value>, StoreError> {
        tracing::debug!(query = query.name, params = params.len(), "fetch_all");
        let mut q = sqlx::query(query.sql);
        for p in params {
            q = q.bind(p.clone());
        }
        let rows = q.fetch_all(&self.pool).await?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    async fn fetch_count(&self, query: NamedQuery<'_>, params: &[BindValue]) -> Result<i64, StoreError> {
        tracing::debug!(query = query.name, params = params.len(), "fetch_count");
        let mut q = sqlx::query_scalar::<Postgres, i64>(query.sql);
        for p in params {
            q = q.bind(p.clone());
        }
        Ok(q.fetch_one(&self.pool).await?)
    }

    async fn delete_guarded(
        &self,
        checks: &[NamedQuery<'_>],
        delete: NamedQuery<'_>,
        id: &BindValue,
    ) -> Result<GuardedDelete, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut counts = Vec::with_capacity(checks.len());
        for check in checks {
            tracing::debug!(query = check.name, "dependency check");
            let n = sqlx::query_scalar::<Postgres, i64>(check.sql)
                .bind(id.clone())
                .fetch_one(&mut *tx)
                .await?;
            counts.push(n);
        }
        if counts.iter().any(|n| *n > 0) {
            tx.rollback().await?;
            return Ok(GuardedDelete::Refused(counts));
        }
        tracing::debug!(query = delete.name, "delete");
        let result = sqlx::query(delete.sql).bind(id.clone()).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(GuardedDelete::Deleted(result.rows_affected()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn row_to_json(row: &PgRow) -> Value {
    let mut map = Map::new();
    for col in row.columns() {
        let v = cell_to_value(row, col.ordinal(), col.type_info().name());
        map.insert(col.name().to_string(), v);
    }
    Value::Object(map)
}

fn get<'r, T>(row: &'r PgRow, idx: usize) -> Option<T>
where
    T: Decode<'r, Postgres> + Type<Postgres>,
{
    row.try_get::<Option<T>, _>(idx).ok().flatten()
}

fn float(n: Option<f64>) -> Option<Value> {
    n.and_then(serde_json::Number::from_f64).map(Value::Number)
}

fn cell_to_value(row: &PgRow, idx: usize, type_name: &str) -> Value {
    let v = match type_name {
        "INT2" => get::<i16>(row, idx).map(Value::from),
        "INT4" => get::<i32>(row, idx).map(Value::from),
        "INT8" => get::<i64>(row, idx).map(Value::from),
        "FLOAT4" => float(get::<f32>(row, idx).map(f64::from)),
        "FLOAT8" => float(get::<f64>(row, idx)),
        "BOOL" => get::<bool>(row, idx).map(Value::Bool),
        "UUID" => get::<uuid::Uuid>(row, idx).map(|u| Value::String(u.to_string())),
        "TIMESTAMPTZ" => get::<chrono::DateTime<chrono::Utc>>(row, idx).map(|d| Value::String(d.to_rfc3339())),
        "TIMESTAMP" => get::<chrono::NaiveDateTime>(row, idx)
            .map(|d| Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string())),
        "DATE" => get::<chrono::NaiveDate>(row, idx).map(|d| Value::String(d.format("%Y-%m-%d").to_string())),
        "JSON" | "JSONB" => get::<Value>(row, idx),
        _ => get::<String>(row, idx).map(Value::String),
    };
    v.unwrap_or(Value::Null)
}

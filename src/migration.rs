//! Idempotent table DDL for the catalogued entities.

use crate::error::AppError;
use crate::sql::SCHEMA_DDL;
use sqlx::PgPool;

/// Create every entity table and index that does not exist yet.
pub async fn apply_schema(pool: &PgPool) -> Result<(), AppError> {
    sqlx::raw_sql(SCHEMA_DDL).execute(pool).await?;
    tracing::info!("schema applied");
    Ok(())
}

//! Database bootstrap: create the target database when missing and open the pool.

use crate::config::AppConfig;
use crate::error::{AppError, ConfigError};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::ConnectOptions;
use std::str::FromStr;

/// Connect to the `postgres` maintenance database on the same server and
/// `CREATE DATABASE` when the one named in `database_url` does not exist.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = split_db_name(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = PgConnectOptions::from_str(&admin_url).map_err(|e| invalid_url(e.to_string()))?;
    let mut conn = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
        tracing::info!(database = %db_name, "created database");
    }
    Ok(())
}

pub async fn connect(config: &AppConfig) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(&config.database_url)
        .await?;
    tracing::info!(max_connections = config.max_connections, "connected to database");
    Ok(pool)
}

fn invalid_url(reason: String) -> AppError {
    ConfigError::Invalid {
        key: "DATABASE_URL",
        reason,
    }
    .into()
}

/// `postgres://host/stock?sslmode=disable` -> (`postgres://host/postgres`, `stock`).
fn split_db_name(url: &str) -> Result<(String, String), AppError> {
    let scheme_end = url.find("://").map(|i| i + 3).unwrap_or(0);
    let path_start = url[scheme_end..]
        .find('/')
        .map(|i| scheme_end + i + 1)
        .ok_or_else(|| invalid_url("no database path".into()))?;
    let db_name = url[path_start..].split('?').next().unwrap_or("").trim();
    let admin_url = format!("{}postgres", &url[..path_start]);
    Ok((admin_url, db_name.to_string()))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_database_name_from_url() {
        let (admin, db) = split_db_name("postgres://app:secret@db:5432/stock?sslmode=disable").unwrap();
        assert_eq!(admin, "postgres://app:secret@db:5432/postgres");
        assert_eq!(db, "stock");
    }

    #[test]
    fn url_without_path_is_invalid() {
        assert!(matches!(
            split_db_name("postgres://db:5432"),
            Err(AppError::Config(ConfigError::Invalid { key: "DATABASE_URL", .. }))
        ));
    }

    #[test]
    fn identifiers_are_quoted() {
        assert_eq!(quote_ident("stock"), "\"stock\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}

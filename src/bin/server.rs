//! HTTP server: loads configuration, prepares the database and serves the API.

use barrest_crud::{
    app, apply_schema, connect, ensure_database_exists, schema, AppConfig, AppState, Catalog, PgRunner, QueryStore,
    Repository,
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("barrest_crud=info,tower_http=info")),
        )
        .init();

    let queries = QueryStore::load(config.query_dir.as_deref())?;
    let catalog = Catalog::builtin()?;
    schema::validate(&catalog, &queries)?;
    tracing::info!(queries = queries.len(), entities = catalog.entities().len(), "query store ready");

    if config.create_database {
        ensure_database_exists(&config.database_url).await?;
    }
    let pool = connect(&config).await?;
    if config.apply_schema {
        apply_schema(&pool).await?;
    }

    let repository = Repository::new(Arc::new(PgRunner::new(pool)), Arc::new(queries));
    let state = AppState::new(repository, catalog);
    let router = app(state, config.body_limit_bytes);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}

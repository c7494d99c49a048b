//! Barrest CRUD: schema-driven REST service over PostgreSQL with named SQL queries.

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod migration;
pub mod response;
pub mod routes;
pub mod schema;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use config::AppConfig;
pub use error::{AppError, ConfigError, QueryError, StoreError};
pub use migration::apply_schema;
pub use routes::{app, entity_routes, ops_routes};
pub use schema::Catalog;
pub use service::{PgRunner, QueryRunner, Repository};
pub use sql::QueryStore;
pub use state::AppState;
pub use store::{connect, ensure_database_exists};

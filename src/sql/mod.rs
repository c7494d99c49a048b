//! Named SQL statements and typed parameters. Statement text comes only from the
//! query store; values are always bound as parameters.

pub mod params;
pub mod store;

pub use params::BindValue;
pub use store::QueryStore;

/// Idempotent DDL for the built-in entities.
pub const SCHEMA_DDL: &str = include_str!("schema.sql");

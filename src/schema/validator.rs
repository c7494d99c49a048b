//! Startup check: every statement an entity names must exist in the query store.

use crate::error::ConfigError;
use crate::schema::Catalog;
use crate::sql::QueryStore;

pub fn validate(catalog: &Catalog, queries: &QueryStore) -> Result<(), ConfigError> {
    for entity in catalog.entities() {
        for name in entity.query_names() {
            if !queries.contains(name) {
                return Err(ConfigError::MissingQuery {
                    entity: entity.name,
                    name,
                });
            }
        }
    }
    Ok(())
}

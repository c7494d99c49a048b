//! Shared application state for all routes.

use crate::schema::Catalog;
use crate::service::Repository;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub repository: Repository,
    pub catalog: Arc<Catalog>,
}

impl AppState {
    pub fn new(repository: Repository, catalog: Catalog) -> Self {
        AppState {
            repository,
            catalog: Arc::new(catalog),
        }
    }
}

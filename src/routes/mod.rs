//! Router assembly: ops routes at the root, entity routes under `/api/v1`.

pub mod entity;
pub mod ops;

pub use entity::entity_routes;
pub use ops::ops_routes;

use crate::state::AppState;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

pub const API_PREFIX: &str = "/api/v1";

/// Full application router.
pub fn app(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .merge(ops_routes(state.clone()))
        .nest(API_PREFIX, entity_routes(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(body_limit)),
        )
}

//! Operational endpoints mounted at the root, outside the API prefix.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ServiceStatus {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct BuildInfo {
    name: &'static str,
    version: &'static str,
}

const BUILD: BuildInfo = BuildInfo {
    name: env!("CARGO_PKG_NAME"),
    version: env!("CARGO_PKG_VERSION"),
};

/// The process is up; says nothing about the store.
async fn liveness() -> Json<ServiceStatus> {
    Json(ServiceStatus {
        status: "ok",
        database: None,
    })
}

async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ServiceStatus>) {
    match state.repository.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ServiceStatus {
                status: "ok",
                database: Some("ok"),
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "store unreachable, reporting not ready");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ServiceStatus {
                    status: "degraded",
                    database: Some("unavailable"),
                }),
            )
        }
    }
}

async fn build_info() -> Json<BuildInfo> {
    Json(BUILD)
}

/// GET /health, GET /ready (pings the store) and GET /version.
pub fn ops_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(liveness))
        .route("/ready", get(readiness))
        .route("/version", get(build_info))
        .with_state(state)
}

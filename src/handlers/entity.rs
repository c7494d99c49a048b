//! Entity CRUD handlers: list, create, read, update, delete.
//! Routes are parameterized by collection path; handlers resolve the entity from the catalog.

use crate::error::AppError;
use crate::extractors::{JsonBody, QueryParams};
use crate::response::{page_body, sentence_case, success_created, success_empty, success_ok};
use crate::schema::EntitySchema;
use crate::service::{DeleteOutcome, Pagination, RequestValidator};
use crate::sql::BindValue;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

fn entity_for(state: &AppState, path_segment: &str) -> Result<&'static EntitySchema, AppError> {
    state
        .catalog
        .by_path(path_segment)
        .ok_or_else(|| AppError::NotFound(format!("unknown collection: {}", path_segment)))
}

fn parse_id(id_str: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id_str).map_err(|_| AppError::BadRequest(format!("invalid id '{}': expected a UUID", id_str)))
}

fn not_found(entity: &EntitySchema) -> AppError {
    AppError::NotFound(format!("{} not found", sentence_case(entity.label)))
}

fn parent_filter(entity: &EntitySchema, params: &QueryParams) -> Result<Option<BindValue>, AppError> {
    let Some(parent) = entity.parent else {
        return Ok(None);
    };
    match params.get(parent.param).map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => BindValue::parse_str(parent.kind, raw).map(Some).ok_or_else(|| {
            AppError::Validation(format!("{} must be {}", parent.param, parent.kind.describe()))
        }),
        None => Ok(None),
    }
}

pub async fn list(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    params: QueryParams,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity_for(&state, &path_segment)?;
    let pagination = Pagination::from_query(params.get("page"), params.get("limit"));
    let parent = parent_filter(entity, &params)?;
    let page = state.repository.list(entity, pagination, parent).await?;
    let body = page_body(
        entity.collection_key,
        page.items,
        page.total,
        page.pagination.page,
        page.pagination.limit,
    );
    Ok(success_ok(format!("{} retrieved", sentence_case(entity.label_plural)), body))
}

pub async fn create(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    JsonBody(body): JsonBody,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity_for(&state, &path_segment)?;
    RequestValidator::validate_create(entity, &body)?;
    let row = state.repository.create(entity, &body).await?;
    Ok(success_created(format!("{} created", sentence_case(entity.label)), row))
}

pub async fn read(
    State(state): State<AppState>,
    Path((path_segment, id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity_for(&state, &path_segment)?;
    let id = parse_id(&id_str)?;
    let row = state.repository.get(entity, id).await?.ok_or_else(|| not_found(entity))?;
    Ok(success_ok(format!("{} retrieved", sentence_case(entity.label)), row))
}

pub async fn update(
    State(state): State<AppState>,
    Path((path_segment, id_str)): Path<(String, String)>,
    JsonBody(body): JsonBody,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity_for(&state, &path_segment)?;
    let id = parse_id(&id_str)?;
    RequestValidator::validate_update(entity, &body)?;
    let row = state
        .repository
        .update(entity, id, &body)
        .await?
        .ok_or_else(|| not_found(entity))?;
    Ok(success_ok(format!("{} updated", sentence_case(entity.label)), row))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((path_segment, id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity_for(&state, &path_segment)?;
    let id = parse_id(&id_str)?;
    match state.repository.delete(entity, id).await? {
        DeleteOutcome::Deleted => Ok(success_empty(format!("{} deleted", sentence_case(entity.label)))),
        DeleteOutcome::NotFound => Err(not_found(entity)),
    }
}

//! Standard response envelope helpers.

use axum::{http::StatusCode, Json};
use serde::Serialize;
use serde_json::Value;

/// `{code, message, data}`; `data` is omitted when there is nothing to return.
#[derive(Serialize)]
pub struct Envelope<T> {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

pub fn success<T: Serialize>(status: StatusCode, message: String, data: Option<T>) -> (StatusCode, Json<Envelope<T>>) {
    (
        status,
        Json(Envelope {
            code: status.as_u16(),
            message,
            data,
        }),
    )
}

pub fn success_ok<T: Serialize>(message: String, data: T) -> (StatusCode, Json<Envelope<T>>) {
    success(StatusCode::OK, message, Some(data))
}

pub fn success_created<T: Serialize>(message: String, data: T) -> (StatusCode, Json<Envelope<T>>) {
    success(StatusCode::CREATED, message, Some(data))
}

pub fn success_empty(message: String) -> (StatusCode, Json<Envelope<Value>>) {
    success(StatusCode::OK, message, None)
}

/// Paginated list payload: items under the entity's collection key plus paging totals.
pub fn page_body(collection_key: &str, items: Vec<Value>, total: i64, page: u32, limit: u32) -> Value {
    let mut body = serde_json::Map::new();
    body.insert(collection_key.to_string(), Value::Array(items));
    body.insert("total".into(), total.into());
    body.insert("page".into(), page.into());
    body.insert("limit".into(), limit.into());
    Value::Object(body)
}

/// "stock sub-categories" -> "Stock sub-categories".
pub fn sentence_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

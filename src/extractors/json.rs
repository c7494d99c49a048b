//! JSON request body whose rejections use the error envelope.

use crate::error::AppError;
use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde_json::{Map, Value};

/// Body that must be a JSON object. Malformed JSON, a wrong content type or a
/// non-object body are all `bad_request`.
#[derive(Clone, Debug)]
pub struct JsonBody(pub Map<String, Value>);

#[async_trait]
impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| AppError::BadRequest(format!("invalid request body: {}", e.body_text())))?;
        match value {
            Value::Object(m) => Ok(JsonBody(m)),
            _ => Err(AppError::BadRequest("body must be a JSON object".into())),
        }
    }
}

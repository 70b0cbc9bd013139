//! ObjectId path parameter extractor.

use crate::errors::{AppError, FieldError};
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use mongodb::bson::oid::ObjectId;

pub const INVALID_ID_MESSAGE: &str = "Invalid ID format";

/// `{id}` path segment parsed as a 24-hex-digit ObjectId.
///
/// Anything else is rejected before the handler runs with a validation
/// envelope naming the `id` param.
pub struct ObjectIdPath(pub ObjectId);

impl<S> FromRequestParts<S> for ObjectIdPath
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        ObjectId::parse_str(&id).map(ObjectIdPath).map_err(|_| {
            AppError::Validation(vec![FieldError::params(
                "id",
                INVALID_ID_MESSAGE,
                serde_json::Value::String(id),
            )])
        })
    }
}

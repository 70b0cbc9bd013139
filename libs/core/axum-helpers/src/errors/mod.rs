pub mod codes;
pub mod handlers;
pub mod responses;
pub mod validation;

pub use codes::ErrorCode;
pub use validation::{FieldError, FieldLocation, field_errors};

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

pub const VALIDATION_ERROR_MESSAGE: &str = "Validation error";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Error envelope returned for every failed request.
///
/// ```json
/// {
///   "success": false,
///   "error": "Validation error",
///   "errors": [
///     { "field": "basePrice", "message": "Base price must be a positive number", "value": -1, "location": "body" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,
    /// Human-readable error message
    pub error: String,
    /// Field-level violations, present for validation failures only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            errors: None,
        }
    }

    pub fn with_errors(mut self, errors: Vec<FieldError>) -> Self {
        self.errors = Some(errors);
        self
    }
}

/// Error type rendered at the HTTP boundary.
///
/// Every variant becomes an [`ErrorResponse`]. `Internal` details are logged
/// and replaced by a generic message before they reach the client.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("Validation error: {} field(s) rejected", .0.len())]
    Validation(Vec<FieldError>),

    #[error("JSON extraction error: {0}")]
    JsonExtractorRejection(#[from] JsonRejection),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    /// A referenced resource does not exist (e.g. a product's category)
    #[error("Reference not found: {0}")]
    ReferenceNotFound(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Too Many Requests: {0}")]
    TooManyRequests(String),

    #[error("Service Unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) | AppError::ReferenceNotFound(_) => {
                StatusCode::BAD_REQUEST
            }
            // Malformed or mistyped JSON is reported like any other bad input
            AppError::JsonExtractorRejection(
                JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_),
            ) => StatusCode::BAD_REQUEST,
            AppError::JsonExtractorRejection(e) => e.status(),
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation(_) => ErrorCode::ValidationError,
            AppError::JsonExtractorRejection(_) => ErrorCode::JsonExtraction,
            AppError::BadRequest(_) => ErrorCode::BadRequest,
            AppError::ReferenceNotFound(_) => ErrorCode::ReferenceNotFound,
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::Conflict(_) => ErrorCode::Conflict,
            AppError::TooManyRequests(_) => ErrorCode::TooManyRequests,
            AppError::ServiceUnavailable(_) => ErrorCode::ServiceUnavailable,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let body = match self {
            AppError::Validation(errors) => {
                tracing::info!(
                    error_code = code.code(),
                    fields = errors.len(),
                    "Request validation failed"
                );
                ErrorResponse::new(VALIDATION_ERROR_MESSAGE).with_errors(errors)
            }
            AppError::JsonExtractorRejection(e) => {
                tracing::warn!(error_code = code.code(), "JSON extraction error: {:?}", e);
                ErrorResponse::new(e.body_text())
            }
            AppError::Internal(detail) => {
                tracing::error!(error_code = code.code(), "Internal server error: {}", detail);
                ErrorResponse::new(INTERNAL_ERROR_MESSAGE)
            }
            AppError::ServiceUnavailable(msg) | AppError::TooManyRequests(msg) => {
                tracing::warn!(error_code = code.code(), "{}", msg);
                ErrorResponse::new(msg)
            }
            AppError::BadRequest(msg)
            | AppError::ReferenceNotFound(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => {
                tracing::info!(error_code = code.code(), "{}", msg);
                ErrorResponse::new(msg)
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};

    async fn render(error: AppError) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_error_lists_fields() {
        let (status, body) = render(AppError::Validation(vec![FieldError::body(
            "name",
            "Name must be 1-100 characters",
            json!(""),
        )]))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({
                "success": false,
                "error": "Validation error",
                "errors": [{
                    "field": "name",
                    "message": "Name must be 1-100 characters",
                    "value": "",
                    "location": "body"
                }]
            })
        );
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let (status, body) =
            render(AppError::Internal("connection reset by peer".to_string())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "success": false, "error": "Internal server error" }));
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let cases = [
            (AppError::NotFound("Product not found".into()), StatusCode::NOT_FOUND),
            (AppError::Conflict("Duplicate sku: A-1".into()), StatusCode::CONFLICT),
            (
                AppError::ReferenceNotFound("Category not found".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::TooManyRequests("slow down".into()),
                StatusCode::TOO_MANY_REQUESTS,
            ),
        ];

        for (error, expected) in cases {
            let message = match &error {
                AppError::NotFound(m)
                | AppError::Conflict(m)
                | AppError::ReferenceNotFound(m)
                | AppError::TooManyRequests(m) => m.clone(),
                _ => unreachable!(),
            };
            let (status, body) = render(error).await;
            assert_eq!(status, expected);
            assert_eq!(body["success"], false);
            assert_eq!(body["error"], message);
            assert!(body.get("errors").is_none());
        }
    }
}

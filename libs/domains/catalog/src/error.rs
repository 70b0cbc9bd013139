use axum::response::{IntoResponse, Response};
use axum_helpers::{AppError, FieldError};
use mongodb::bson::oid::ObjectId;
use mongodb::error::{ErrorKind, WriteFailure};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

pub const PRODUCT_NOT_FOUND: &str = "Product not found";
pub const CATEGORY_NOT_FOUND: &str = "Category not found";
pub const CATEGORY_IN_USE: &str = "Cannot delete category with existing products";

/// MongoDB server code for a unique index violation
const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Invalid input: {} field(s) rejected", .0.len())]
    Validation(Vec<FieldError>),

    #[error("Product not found: {0}")]
    ProductNotFound(ObjectId),

    #[error("Category not found: {0}")]
    CategoryNotFound(ObjectId),

    /// A product names a category that does not exist
    #[error("Referenced category not found: {0}")]
    MissingCategory(ObjectId),

    #[error("Duplicate {field}: {value}")]
    Duplicate { field: String, value: String },

    #[error("Category {0} still has products")]
    CategoryInUse(ObjectId),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Validation(errors) => AppError::Validation(errors),
            CatalogError::ProductNotFound(_) => AppError::NotFound(PRODUCT_NOT_FOUND.to_string()),
            CatalogError::CategoryNotFound(_) => {
                AppError::NotFound(CATEGORY_NOT_FOUND.to_string())
            }
            CatalogError::MissingCategory(_) => {
                AppError::ReferenceNotFound(CATEGORY_NOT_FOUND.to_string())
            }
            CatalogError::Duplicate { field, value } => {
                AppError::Conflict(format!("Duplicate {field}: {value}"))
            }
            CatalogError::CategoryInUse(_) => AppError::Conflict(CATEGORY_IN_USE.to_string()),
            CatalogError::Database(msg) => AppError::Internal(msg),
            CatalogError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<mongodb::error::Error> for CatalogError {
    fn from(err: mongodb::error::Error) -> Self {
        let duplicate = match err.kind.as_ref() {
            ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY_CODE => {
                Some(e.message.as_str())
            }
            ErrorKind::Command(e) if e.code == DUPLICATE_KEY_CODE => Some(e.message.as_str()),
            _ => None,
        };

        match duplicate {
            Some(message) => {
                let (field, value) = parse_duplicate_key(message)
                    .unwrap_or_else(|| ("key".to_string(), "unknown".to_string()));
                CatalogError::Duplicate { field, value }
            }
            None => CatalogError::Database(err.to_string()),
        }
    }
}

impl From<mongodb::bson::de::Error> for CatalogError {
    fn from(err: mongodb::bson::de::Error) -> Self {
        CatalogError::Database(format!("Failed to decode document: {err}"))
    }
}

static DUP_KEY: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r#"dup key: \{\s*([^:\s]+)\s*:\s*(.*?)\s*\}"#).ok());

/// Extracts the offending field and value from an E11000 server message,
/// e.g. `... index: variants.sku_1 dup key: { variants.sku: "TS-RED-M" }`.
fn parse_duplicate_key(message: &str) -> Option<(String, String)> {
    let captures = DUP_KEY.as_ref()?.captures(message)?;
    let field = captures.get(1)?.as_str().to_string();
    let value = captures.get(2)?.as_str().trim_matches('"').to_string();
    Some((field, value))
}

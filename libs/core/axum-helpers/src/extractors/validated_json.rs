//! JSON extractor with automatic validation using the validator crate.

use crate::errors::{AppError, FieldError, FieldLocation, field_errors};
use axum::extract::{FromRequest, Json, Request};
use serde::de::DeserializeOwned;
use serde_json::Value;
use serde_path_to_error::{Path, Segment};
use validator::Validate;

/// Upper bound on mistyped fields collected from one body
const MAX_TYPE_ERRORS: usize = 32;

/// JSON body, deserialized and then validated.
///
/// Malformed JSON is rejected with 400 and the extractor's message. A field
/// holding the wrong JSON type is reported alongside the rule violations of
/// the remaining fields, one entry per field.
///
/// ```ignore
/// #[derive(Deserialize, Validate)]
/// struct CreateCategory {
///     #[serde(default)]
///     #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
///     name: String,
/// }
///
/// async fn create(ValidatedJson(input): ValidatedJson<CreateCategory>) -> impl IntoResponse {
///     // input is valid here
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state).await?;
        let (data, type_errors) = deserialize_lenient::<T>(value)?;

        let mut errors = match data.validate() {
            Ok(()) => Vec::new(),
            Err(e) => field_errors(&e, FieldLocation::Body),
        };
        merge_type_errors(&mut errors, type_errors);

        if errors.is_empty() {
            Ok(ValidatedJson(data))
        } else {
            Err(AppError::Validation(errors))
        }
    }
}

/// Deserializes `value`, dropping each mistyped field and retrying so the
/// rest of the body still reaches validation.
///
/// Dropped fields fall back to their serde default. When a field cannot be
/// dropped the collected errors are returned as they are.
fn deserialize_lenient<T: DeserializeOwned>(
    mut value: Value,
) -> Result<(T, Vec<FieldError>), AppError> {
    let mut type_errors: Vec<FieldError> = Vec::new();

    loop {
        let err = match serde_path_to_error::deserialize::<_, T>(&value) {
            Ok(data) => return Ok((data, type_errors)),
            Err(err) => err,
        };

        let field = json_path(err.path());
        if field.is_empty() {
            return Err(if type_errors.is_empty() {
                AppError::BadRequest(format!(
                    "Failed to deserialize the JSON body into the target type: {}",
                    err.inner()
                ))
            } else {
                AppError::Validation(type_errors)
            });
        }

        if type_errors.iter().any(|e| e.field == field) {
            return Err(AppError::Validation(type_errors));
        }

        let message = type_message(err.inner());
        let Some(sent) = take(&mut value, err.path()) else {
            type_errors.push(FieldError::body(field, message, Value::Null));
            return Err(AppError::Validation(type_errors));
        };
        type_errors.push(FieldError::body(field, message, sent));
        if type_errors.len() >= MAX_TYPE_ERRORS {
            return Err(AppError::Validation(type_errors));
        }
    }
}

/// Rule violations on a mistyped field keep their message but report the
/// value the client actually sent.
fn merge_type_errors(errors: &mut Vec<FieldError>, type_errors: Vec<FieldError>) {
    for type_error in type_errors {
        match errors.iter_mut().find(|e| e.field == type_error.field) {
            Some(existing) => existing.value = type_error.value,
            None => errors.push(type_error),
        }
    }
    errors.sort_by(|a, b| a.field.cmp(&b.field));
}

fn json_path(path: &Path) -> String {
    let mut out = String::new();
    for segment in path.iter() {
        match segment {
            Segment::Seq { index } => out.push_str(&format!("[{index}]")),
            Segment::Map { key } => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(key);
            }
            Segment::Enum { .. } | Segment::Unknown => {}
        }
    }
    out
}

/// Removes the value at `path`; array elements are nulled to keep indices
fn take(value: &mut Value, path: &Path) -> Option<Value> {
    let segments: Vec<&Segment> = path.iter().collect();
    let (last, parents) = segments.split_last()?;

    let mut current = value;
    for segment in parents {
        current = match segment {
            Segment::Map { key } => current.get_mut(key.as_str())?,
            Segment::Seq { index } => current.get_mut(*index)?,
            Segment::Enum { .. } | Segment::Unknown => return None,
        };
    }

    match last {
        Segment::Map { key } => current.as_object_mut()?.remove(key.as_str()),
        Segment::Seq { index } => current.get_mut(*index).map(Value::take),
        Segment::Enum { .. } | Segment::Unknown => None,
    }
}

fn type_message(err: &serde_json::Error) -> String {
    let text = err.to_string();
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => text,
    }
}

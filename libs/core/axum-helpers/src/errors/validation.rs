//! Field-level validation errors.
//!
//! `validator` reports failures as a nested tree keyed by Rust field names.
//! The envelope wants a flat list keyed by the JSON path the client sent, so
//! [`field_errors`] walks the tree, converts names to camelCase and keeps the
//! first failing rule per field.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

/// Key `validator` uses for struct-level (`schema`) errors
const SCHEMA_KEY: &str = "__all__";

/// Where the rejected value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FieldLocation {
    Body,
    Query,
    Params,
}

/// One rejected field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    /// JSON path of the field, e.g. `variants[0].sku`
    pub field: String,
    pub message: String,
    /// The value the client sent, `null` when absent
    #[serde(default)]
    #[schema(value_type = Object)]
    pub value: Value,
    pub location: FieldLocation,
}

impl FieldError {
    pub fn new(
        field: impl Into<String>,
        message: impl Into<String>,
        value: Value,
        location: FieldLocation,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            value,
            location,
        }
    }

    pub fn body(field: impl Into<String>, message: impl Into<String>, value: Value) -> Self {
        Self::new(field, message, value, FieldLocation::Body)
    }

    pub fn query(field: impl Into<String>, message: impl Into<String>, value: Value) -> Self {
        Self::new(field, message, value, FieldLocation::Query)
    }

    pub fn params(field: impl Into<String>, message: impl Into<String>, value: Value) -> Self {
        Self::new(field, message, value, FieldLocation::Params)
    }
}

/// Flattens `errors` into one entry per field, sorted by field path.
///
/// Struct-level errors name their target through a `field` param; each of
/// them is reported rather than only the first.
pub fn field_errors(errors: &ValidationErrors, location: FieldLocation) -> Vec<FieldError> {
    let mut out = Vec::new();
    collect(errors, "", location, &mut out);
    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}

fn collect(errors: &ValidationErrors, prefix: &str, location: FieldLocation, out: &mut Vec<FieldError>) {
    for (key, kind) in errors.errors() {
        let key = key.to_string();

        match kind {
            ValidationErrorsKind::Field(list) if key == SCHEMA_KEY => {
                for error in list {
                    let field = error
                        .params
                        .get("field")
                        .and_then(Value::as_str)
                        .unwrap_or_default();
                    out.push(to_field_error(join(prefix, field), error, location));
                }
            }
            ValidationErrorsKind::Field(list) => {
                if let Some(first) = list.first() {
                    out.push(to_field_error(join(prefix, &camel_case(&key)), first, location));
                }
            }
            ValidationErrorsKind::Struct(inner) => {
                collect(inner, &join(prefix, &camel_case(&key)), location, out);
            }
            ValidationErrorsKind::List(items) => {
                let path = join(prefix, &camel_case(&key));
                for (index, inner) in items {
                    collect(inner, &format!("{path}[{index}]"), location, out);
                }
            }
        }
    }
}

fn to_field_error(field: String, error: &ValidationError, location: FieldLocation) -> FieldError {
    let message = error
        .message
        .as_ref()
        .map(|m| m.to_string())
        .unwrap_or_else(|| format!("Invalid value ({})", error.code));
    let value = error.params.get("value").cloned().unwrap_or(Value::Null);

    FieldError::new(field, message, value, location)
}

fn join(prefix: &str, name: &str) -> String {
    match (prefix.is_empty(), name.is_empty()) {
        (true, _) => name.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{prefix}.{name}"),
    }
}

fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = !out.is_empty();
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

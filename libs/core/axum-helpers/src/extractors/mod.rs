//! Extractors that reject with the error envelope instead of plain text.

pub mod object_id_path;
pub mod validated_json;
pub mod validated_query;

pub use object_id_path::ObjectIdPath;
pub use validated_json::ValidatedJson;
pub use validated_query::{FromQueryParams, ValidatedQuery};

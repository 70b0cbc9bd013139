//! Query-string extractor that reports every bad parameter at once.

use crate::errors::{AppError, FieldError};
use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

/// Typed query built from raw string parameters.
///
/// `Params` should hold `Option<String>` fields so that deserialization never
/// fails; range and format checks happen in [`from_query_params`](Self::from_query_params)
/// where they can be reported per field.
pub trait FromQueryParams: Sized {
    type Params: DeserializeOwned + Send;

    fn from_query_params(params: Self::Params) -> Result<Self, Vec<FieldError>>;
}

pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: FromQueryParams,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<T::Params>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        T::from_query_params(params)
            .map(ValidatedQuery)
            .map_err(AppError::Validation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, extract::Request, http::StatusCode, routing::get};
    use http_body_util::BodyExt;
    use serde::Deserialize;
    use serde_json::Value;
    use tower::ServiceExt;

    #[derive(Deserialize)]
    struct RawPage {
        page: Option<String>,
    }

    struct Page(u64);

    impl FromQueryParams for Page {
        type Params = RawPage;

        fn from_query_params(params: RawPage) -> Result<Self, Vec<FieldError>> {
            match params.page {
                None => Ok(Page(1)),
                Some(raw) => match raw.parse::<u64>() {
                    Ok(n) if n >= 1 => Ok(Page(n)),
                    _ => Err(vec![FieldError::query(
                        "page",
                        "Page must be a positive integer",
                        Value::String(raw),
                    )]),
                },
            }
        }
    }

    async fn call(uri: &str) -> (StatusCode, Vec<u8>) {
        let app = Router::new().route(
            "/",
            get(|ValidatedQuery(Page(n)): ValidatedQuery<Page>| async move { n.to_string() }),
        );
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn test_defaults_and_parses() {
        assert_eq!(call("/").await, (StatusCode::OK, b"1".to_vec()));
        assert_eq!(call("/?page=4").await, (StatusCode::OK, b"4".to_vec()));
    }

    #[tokio::test]
    async fn test_rejects_with_query_location() {
        let (status, body) = call("/?page=0").await;
        let body: Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["field"], "page");
        assert_eq!(body["errors"][0]["value"], "0");
        assert_eq!(body["errors"][0]["location"], "query");
    }
}

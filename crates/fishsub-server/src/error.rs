//! Maps the pipeline core's `fishsub_core::Error` onto the uniform HTTP
//! envelope `{ data, errors[] }` (spec §6): a single `IntoResponse` type
//! every handler funnels failures through.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorItem {
    code: &'static str,
    message: String,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    data: Option<()>,
    errors: Vec<ErrorItem>,
}

pub struct ApiError(pub fishsub_core::Error);

impl From<fishsub_core::Error> for ApiError {
    fn from(err: fishsub_core::Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_class()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self.0, code = self.0.code(), "request failed");
        } else {
            tracing::warn!(error = %self.0, code = self.0.code(), "request rejected");
        }
        let body = ErrorEnvelope {
            data: None,
            errors: vec![ErrorItem {
                code: self.0.code(),
                message: self.0.to_string(),
            }],
        };
        (status, axum::Json(body)).into_response()
    }
}

/// Wraps a successful payload in the same envelope shape, with an empty
/// `errors` array.
pub fn ok<T: Serialize>(data: T) -> axum::response::Response {
    #[derive(Serialize)]
    struct OkEnvelope<T> {
        data: T,
        errors: [(); 0],
    }
    (StatusCode::OK, axum::Json(OkEnvelope { data, errors: [] })).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn not_found_maps_to_404_with_matching_code() {
        let response =
            ApiError(fishsub_core::Error::SolicitationNotFound(uuid::Uuid::nil())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_input_maps_to_422() {
        let response = ApiError(fishsub_core::Error::InvalidInput("bad request".into())).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn domain_error_maps_to_500() {
        let response = ApiError(fishsub_core::Error::Domain(anyhow::anyhow!("boom"))).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

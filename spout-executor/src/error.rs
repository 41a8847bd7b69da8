use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use spout_core::InvocationResult;
use thiserror::Error;
use tracing::{error, warn};

const INVALID_METHOD_BODY: &str = "Invalid request method";

/// Failures of a single HTTP-mode request.
///
/// Only `InvalidMethod` is distinguishable on the wire. Every other variant
/// is reported as a bare `{"Success":false}` envelope with the detail logged.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Invalid request method")]
    InvalidMethod,

    #[error("Request body is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("Malformed invocation request: {0}")]
    Request(#[from] serde_json::Error),

    #[error(transparent)]
    Invocation(#[from] spout_core::Error),

    #[error("Handler task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl IntoResponse for ExecutorError {
    fn into_response(self) -> Response {
        match &self {
            ExecutorError::InvalidMethod => {
                warn!("Rejected request with invalid method");
                return (StatusCode::NOT_FOUND, INVALID_METHOD_BODY).into_response();
            }
            ExecutorError::Encoding(_) | ExecutorError::Request(_) => {
                warn!(error = %self, "Rejected malformed invocation request");
            }
            ExecutorError::Invocation(_) | ExecutorError::Join(_) => {
                error!(error = %self, "Invocation failed");
            }
        }

        let body = serde_json::to_string(&InvocationResult::failure())
            .unwrap_or_else(|_| "{\"Success\":false}".to_string());

        let mut response = Response::new(body.into());
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;

        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use rstest::rstest;
    use spout_core::LoadError;
    use std::path::PathBuf;

    async fn body_string(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_invalid_method_is_plain_not_found() {
        let response = ExecutorError::InvalidMethod.into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_ne!(
            response.headers().get(header::CONTENT_TYPE),
            Some(&HeaderValue::from_static("application/json"))
        );
        assert_eq!(body_string(response).await, "Invalid request method");
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn test_failure_detail_is_logged() {
        let error = ExecutorError::Invocation(
            LoadError::NotFound(PathBuf::from("/handlers/missing.js")).into(),
        );

        let _ = error.into_response();

        assert!(logs_contain("Invocation failed"));
        assert!(logs_contain("missing.js"));
    }

    #[rstest]
    #[case::malformed_json(ExecutorError::Request(
        serde_json::from_str::<serde_json::Value>("{").unwrap_err()
    ))]
    #[case::load_failure(ExecutorError::Invocation(
        LoadError::NotFound(PathBuf::from("/handlers/missing.js")).into()
    ))]
    #[tokio::test]
    async fn test_failures_hide_detail(#[case] error: ExecutorError) {
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE),
            Some(&HeaderValue::from_static("application/json"))
        );
        assert_eq!(body_string(response).await, r#"{"Success":false}"#);
    }
}

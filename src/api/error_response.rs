//! HTTP error response handling for the API
//!
//! Converts domain errors to HTTP responses with the status from
//! [`ToHttpStatus`] and an [`ApiError`] JSON body.

use crate::error::{ApiError, Error, ToHttpStatus};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::any::Any;

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status_code.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }

        let api_error: ApiError = self.into();
        (status_code, Json(api_error)).into_response()
    }
}

/// Direct conversions are always treated as internal failures; domain errors
/// carry their status through [`Error`] instead.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self)).into_response()
    }
}

/// Response for a handler panic caught by `CatchPanicLayer`
///
/// The panic payload is logged but never sent to the client.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    tracing::error!(panic = detail, "handler panicked");
    ApiError::internal().into_response()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskError;
    use crate::types::TaskId;

    async fn body_of(response: Response) -> ApiError {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn not_found_task_into_response() {
        let id = TaskId::new();
        let response = Error::Task(TaskError::NotFound { id }).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let api_error = body_of(response).await;
        assert_eq!(api_error.error.code, "task_not_found");
        assert_eq!(
            api_error.error.details.unwrap()["task_id"],
            id.to_string()
        );
    }

    #[tokio::test]
    async fn validation_error_into_response() {
        let response = Error::validation("text", "too short").into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let api_error = body_of(response).await;
        assert_eq!(api_error.error.code, "validation_error");
        assert_eq!(api_error.error.details.unwrap()["field"], "text");
    }

    #[tokio::test]
    async fn internal_error_hides_its_message() {
        let response = Error::Internal("lock poisoned at store.rs:42".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let api_error = body_of(response).await;
        assert_eq!(api_error.error.code, "internal_error");
        assert!(!api_error.error.message.contains("store.rs"));
    }

    #[tokio::test]
    async fn queue_full_is_service_unavailable() {
        let response = Error::QueueFull { capacity: 64 }.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_of(response).await.error.code, "queue_full");
    }

    #[tokio::test]
    async fn panic_payload_is_not_exposed() {
        let response = panic_response(Box::new("secret detail".to_string()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let api_error = body_of(response).await;
        assert_eq!(api_error.error.code, "internal_error");
        assert!(!api_error.error.message.contains("secret"));
    }
}

//! Error types for newsbrief
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (task lifecycle, model hub, configuration)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::types::{TaskId, TaskStatus};

/// Result type alias for newsbrief operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for newsbrief
///
/// Each variant carries enough context to build a user-facing message without
/// leaking internals. Variants that represent server-side faults are reported
/// to clients with a generic message (see [`ApiError`]).
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "tasks.workers")
        key: Option<String>,
    },

    /// Request input failed validation
    #[error("validation error: {message}")]
    Validation {
        /// Field that failed validation, when known
        field: Option<String>,
        /// Human-readable reason
        message: String,
    },

    /// Missing or incorrect bearer credential
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Per-client request quota exceeded
    #[error("rate limit exceeded, retry after {retry_after_seconds}s")]
    RateLimited {
        /// Seconds until the next request will be accepted
        retry_after_seconds: u64,
    },

    /// Task lifecycle error
    #[error("task error: {0}")]
    Task(#[from] TaskError),

    /// Summarization collaborator failed
    #[error("summarization failed: {0}")]
    Summarization(String),

    /// Model hub call failed
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Summarizer is not ready to accept work
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Shutdown in progress - not accepting new tasks
    #[error("shutdown in progress: not accepting new tasks")]
    ShuttingDown,

    /// Background job queue is at capacity
    #[error("task queue is full ({capacity} jobs waiting)")]
    QueueFull {
        /// Configured queue capacity
        capacity: usize,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// The REST API answered a client request with an error body
    #[error("API request failed with HTTP {status} ({code}): {message}")]
    Remote {
        /// HTTP status code
        status: u16,
        /// `error.code` from the body
        code: String,
        /// `error.message` from the body
        message: String,
    },

    /// Waiting for a task exceeded its deadline
    #[error("timed out: {0}")]
    Timeout(String),

    /// Unexpected internal failure
    #[error("{0}")]
    Internal(String),
}

/// Task store and lifecycle errors
#[derive(Debug, Error)]
pub enum TaskError {
    /// No live record exists for this identifier (never created, or expired)
    #[error("task {id} not found")]
    NotFound {
        /// The task ID that was looked up
        id: TaskId,
    },

    /// A record with this identifier already exists
    #[error("task {id} already exists")]
    Duplicate {
        /// The conflicting task ID
        id: TaskId,
    },

    /// Requested status change would move the task backwards or out of a terminal state
    #[error("task {id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// The task ID
        id: TaskId,
        /// Current status
        from: TaskStatus,
        /// Requested status
        to: TaskStatus,
    },
}

/// Errors raised while talking to the model hub
#[derive(Debug, Error)]
pub enum ModelError {
    /// The hub answered with a non-success status
    #[error("model {model} returned HTTP {status}: {message}")]
    Status {
        /// Model identifier
        model: String,
        /// HTTP status code
        status: u16,
        /// Message extracted from the hub's error body
        message: String,
    },

    /// The hub answered 2xx but the body did not have the expected shape
    #[error("unexpected response from model {model}: {reason}")]
    MalformedResponse {
        /// Model identifier
        model: String,
        /// What was wrong with the body
        reason: String,
    },

    /// Input was empty after cleaning, nothing to send
    #[error("empty input for model {model}")]
    EmptyInput {
        /// Model identifier
        model: String,
    },
}

/// API error response format
///
/// Serialized as `{"error": {"code": "...", "message": "...", "details": {...}}}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Error details
    pub error: ErrorDetail,
}

/// Error detail inside an [`ApiError`]
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "task_not_found", "validation_error")
    ///
    /// Stable across releases; clients can match on it.
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Create an "internal server error" that reveals nothing about the cause
    pub fn internal() -> Self {
        Self::new("internal_error", INTERNAL_MESSAGE)
    }
}

/// Message used for every 5xx that is not a collaborator or availability error
const INTERNAL_MESSAGE: &str = "internal server error";

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            Error::Config { .. } => 400,
            Error::Unauthorized(_) => 401,
            Error::Task(TaskError::NotFound { .. }) => 404,
            Error::Task(TaskError::Duplicate { .. }) => 409,
            Error::Task(TaskError::InvalidTransition { .. }) => 409,
            Error::Validation { .. } => 422,
            Error::RateLimited { .. } => 429,

            Error::Summarization(_) => 500,
            Error::Model(_) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Internal(_) => 500,

            Error::Network(_) => 502,
            Error::Remote { .. } => 502,

            Error::Timeout(_) => 504,

            Error::ServiceUnavailable(_) => 503,
            Error::ShuttingDown => 503,
            Error::QueueFull { .. } => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Validation { .. } => "validation_error",
            Error::Unauthorized(_) => "unauthorized",
            Error::RateLimited { .. } => "rate_limited",
            Error::Task(e) => match e {
                TaskError::NotFound { .. } => "task_not_found",
                TaskError::Duplicate { .. } => "duplicate_task",
                TaskError::InvalidTransition { .. } => "invalid_transition",
            },
            Error::Summarization(_) => "summarization_failed",
            Error::Model(_) => "model_error",
            Error::ServiceUnavailable(_) => "service_unavailable",
            Error::ShuttingDown => "shutting_down",
            Error::QueueFull { .. } => "queue_full",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Remote { .. } => "remote_error",
            Error::Timeout(_) => "timeout",
            Error::Internal(_) => "internal_error",
        }
    }
}

impl Error {
    /// Shorthand for a field-level validation failure
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// Whether this error describes a server-side fault whose message must not reach clients
    fn is_internal(&self) -> bool {
        matches!(
            self,
            Error::Io(_)
                | Error::Serialization(_)
                | Error::ApiServerError(_)
                | Error::Internal(_)
                | Error::Task(TaskError::Duplicate { .. })
                | Error::Task(TaskError::InvalidTransition { .. })
        )
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        if error.is_internal() {
            return ApiError::internal();
        }

        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Validation {
                field: Some(field), ..
            } => Some(serde_json::json!({ "field": field })),
            Error::RateLimited {
                retry_after_seconds,
            } => Some(serde_json::json!({
                "retry_after_seconds": retry_after_seconds,
            })),
            Error::Task(TaskError::NotFound { id }) => Some(serde_json::json!({
                "task_id": id,
            })),
            Error::QueueFull { capacity } => Some(serde_json::json!({
                "capacity": capacity,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn all_error_variants() -> Vec<(Error, u16, &'static str)> {
        let id = TaskId::new();
        vec![
            (
                Error::Config {
                    message: "workers must be at least 1".into(),
                    key: Some("tasks.workers".into()),
                },
                400,
                "config_error",
            ),
            (
                Error::validation("text", "too short"),
                422,
                "validation_error",
            ),
            (Error::Unauthorized("no token".into()), 401, "unauthorized"),
            (
                Error::RateLimited {
                    retry_after_seconds: 12,
                },
                429,
                "rate_limited",
            ),
            (
                Error::Task(TaskError::NotFound { id }),
                404,
                "task_not_found",
            ),
            (
                Error::Task(TaskError::Duplicate { id }),
                409,
                "duplicate_task",
            ),
            (
                Error::Task(TaskError::InvalidTransition {
                    id,
                    from: TaskStatus::Completed,
                    to: TaskStatus::Processing,
                }),
                409,
                "invalid_transition",
            ),
            (
                Error::Summarization("model exploded".into()),
                500,
                "summarization_failed",
            ),
            (
                Error::Model(ModelError::EmptyInput {
                    model: "facebook/bart-large-cnn".into(),
                }),
                500,
                "model_error",
            ),
            (
                Error::ServiceUnavailable("model not loaded".into()),
                503,
                "service_unavailable",
            ),
            (Error::ShuttingDown, 503, "shutting_down"),
            (Error::QueueFull { capacity: 4 }, 503, "queue_full"),
            (
                Error::Io(std::io::Error::other("disk gone")),
                500,
                "io_error",
            ),
            (
                Error::ApiServerError("bind failed".into()),
                500,
                "api_server_error",
            ),
            (
                Error::Remote {
                    status: 429,
                    code: "rate_limited".into(),
                    message: "slow down".into(),
                },
                502,
                "remote_error",
            ),
            (Error::Timeout("task never finished".into()), 504, "timeout"),
            (Error::Internal("boom".into()), 500, "internal_error"),
        ]
    }

    #[test]
    fn every_variant_maps_to_expected_status_and_code() {
        for (error, status, code) in all_error_variants() {
            assert_eq!(error.status_code(), status, "status for {error:?}");
            assert_eq!(error.error_code(), code, "code for {error:?}");
        }
    }

    #[test]
    fn internal_errors_hide_their_message() {
        let api_error: ApiError = Error::Internal("secret path /etc/shadow".into()).into();
        assert_eq!(api_error.error.code, "internal_error");
        assert_eq!(api_error.error.message, "internal server error");
        assert!(api_error.error.details.is_none());

        let api_error: ApiError = Error::Io(std::io::Error::other("/var/lib/x")).into();
        assert_eq!(api_error.error.code, "internal_error");
        assert!(!api_error.error.message.contains("/var/lib"));
    }

    #[test]
    fn rate_limited_carries_retry_after() {
        let api_error: ApiError = Error::RateLimited {
            retry_after_seconds: 30,
        }
        .into();
        assert_eq!(api_error.error.code, "rate_limited");
        assert_eq!(api_error.error.details.unwrap()["retry_after_seconds"], 30);
    }

    #[test]
    fn validation_error_names_the_field() {
        let api_error: ApiError = Error::validation("title", "title cannot be empty").into();
        assert_eq!(api_error.error.code, "validation_error");
        assert!(api_error.error.message.contains("title cannot be empty"));
        assert_eq!(api_error.error.details.unwrap()["field"], "title");
    }

    #[test]
    fn task_not_found_includes_task_id() {
        let id = TaskId::new();
        let api_error: ApiError = Error::Task(TaskError::NotFound { id }).into();
        assert_eq!(api_error.error.code, "task_not_found");
        assert_eq!(
            api_error.error.details.unwrap()["task_id"],
            serde_json::json!(id.to_string())
        );
    }

    #[test]
    fn summarization_failure_keeps_its_message() {
        let api_error: ApiError = Error::Summarization("model returned HTTP 503".into()).into();
        assert_eq!(api_error.error.code, "summarization_failed");
        assert!(api_error.error.message.contains("HTTP 503"));
    }
}

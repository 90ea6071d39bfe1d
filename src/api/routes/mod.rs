//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`tasks`] - Submission, status polling, inline summaries
//! - [`system`] - Health, OpenAPI

use crate::error::Error;
use crate::types::{Summary, SummaryOverrides, TaskCounts, TaskId, TaskStatus};
use axum::{
    Json, async_trait,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod system;
mod tasks;

pub use system::*;
pub use tasks::*;

// ============================================================================
// Request/Response Types (shared across handlers)
// ============================================================================

/// Request body for `POST /summarize` and `POST /summarize/sync`
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SummarizeRequest {
    /// Article title (1-500 characters)
    pub title: String,
    /// Article body; HTML is stripped before length checks
    pub text: String,
    /// Per-request overrides of the summary settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<SummaryOverrides>,
}

/// Response for `POST /summarize`
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SubmitResponse {
    /// Identifier to poll with `GET /task/{task_id}`
    pub task_id: TaskId,
    /// Always `pending`
    pub status: TaskStatus,
    /// Submission time
    pub created_at: DateTime<Utc>,
}

/// Response for `POST /summarize/sync`
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SyncSummaryResponse {
    /// Always `completed`
    pub status: TaskStatus,
    /// Generated summary
    pub summary: Summary,
    /// Seconds spent summarizing
    pub processing_time: f64,
    /// Response time
    pub timestamp: DateTime<Utc>,
}

/// Response for `GET /health`
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    /// `healthy`, or `degraded` when the model is not loaded or shutdown has begun
    pub status: String,
    /// Current time
    pub timestamp: DateTime<Utc>,
    /// Whether the summarization model is ready
    pub model_loaded: bool,
    /// Crate version
    pub version: String,
    /// Records per status
    pub tasks: TaskCounts,
}

/// JSON body extractor whose rejections are `422 validation_error`
///
/// Malformed JSON, a wrong content type, missing fields and unknown override
/// keys all surface through the standard error body.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(Error::Validation {
                field: None,
                message: rejection.body_text(),
            }),
        }
    }
}

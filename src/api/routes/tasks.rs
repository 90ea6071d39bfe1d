//! Task handlers: background submission, status polling, inline summaries.

use super::{ApiJson, SubmitResponse, SummarizeRequest, SyncSummaryResponse};
use crate::api::AppState;
use crate::error::{ApiError, Error, TaskError};
use crate::types::{TaskId, TaskStatus};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// POST /summarize - Queue an article for background summarization
#[utoipa::path(
    post,
    path = "/summarize",
    tag = "tasks",
    request_body = SummarizeRequest,
    responses(
        (status = 202, description = "Task accepted", body = SubmitResponse),
        (status = 401, description = "Missing or invalid bearer token", body = crate::error::ApiError),
        (status = 422, description = "Invalid input", body = crate::error::ApiError),
        (status = 429, description = "Rate limit exceeded", body = crate::error::ApiError),
        (status = 503, description = "Model not loaded, queue full or shutting down", body = crate::error::ApiError)
    ),
    security(("bearer" = []))
)]
pub async fn submit_summary(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SummarizeRequest>,
) -> Result<(StatusCode, Json<SubmitResponse>), Error> {
    let submission = state
        .service
        .submit(
            &request.title,
            &request.text,
            request.config.unwrap_or_default(),
        )
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            task_id: submission.task_id,
            status: submission.status,
            created_at: submission.created_at,
        }),
    ))
}

/// GET /task/:task_id - Poll a task
#[utoipa::path(
    get,
    path = "/task/{task_id}",
    tag = "tasks",
    params(
        ("task_id" = String, Path, description = "Task ID returned by POST /summarize")
    ),
    responses(
        (status = 200, description = "Current task state", body = crate::types::TaskSnapshot),
        (status = 401, description = "Missing or invalid bearer token", body = crate::error::ApiError),
        (status = 404, description = "Unknown or expired task", body = crate::error::ApiError),
        (status = 429, description = "Rate limit exceeded", body = crate::error::ApiError)
    ),
    security(("bearer" = []))
)]
pub async fn get_task(State(state): State<AppState>, Path(task_id): Path<String>) -> Response {
    // An id that is not a UUID cannot name any task
    let Ok(id) = task_id.parse::<TaskId>() else {
        let body = ApiError::with_details(
            "task_not_found",
            format!("task {task_id} not found"),
            json!({ "task_id": task_id }),
        );
        return (StatusCode::NOT_FOUND, Json(body)).into_response();
    };

    match state.service.get_task(id).await {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(e @ Error::Task(TaskError::NotFound { .. })) => {
            tracing::debug!(task_id = %id, "task not found");
            e.into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// POST /summarize/sync - Summarize inline
#[utoipa::path(
    post,
    path = "/summarize/sync",
    tag = "tasks",
    request_body = SummarizeRequest,
    responses(
        (status = 200, description = "Summary", body = SyncSummaryResponse),
        (status = 401, description = "Missing or invalid bearer token", body = crate::error::ApiError),
        (status = 422, description = "Invalid input (text limited to 10000 characters)", body = crate::error::ApiError),
        (status = 429, description = "Rate limit exceeded", body = crate::error::ApiError),
        (status = 500, description = "Summarization failed", body = crate::error::ApiError),
        (status = 503, description = "Model not loaded or shutting down", body = crate::error::ApiError)
    ),
    security(("bearer" = []))
)]
pub async fn summarize_sync(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SummarizeRequest>,
) -> Result<Json<SyncSummaryResponse>, Error> {
    let result = state
        .service
        .summarize_sync(
            &request.title,
            &request.text,
            request.config.unwrap_or_default(),
        )
        .await?;

    Ok(Json(SyncSummaryResponse {
        status: TaskStatus::Completed,
        summary: result.summary,
        processing_time: result.processing_time,
        timestamp: chrono::Utc::now(),
    }))
}

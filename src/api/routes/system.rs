//! System handlers: health, OpenAPI.

use super::HealthResponse;
use crate::api::AppState;
use axum::{Json, extract::State, response::IntoResponse};

/// GET /health - Health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Service status", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let health = state.service.health().await;
    let status = if health.model_loaded && health.accepting {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        timestamp: chrono::Utc::now(),
        model_loaded: health.model_loaded,
        version: env!("CARGO_PKG_VERSION").to_string(),
        tasks: health.tasks,
    })
}

/// GET /openapi.json - OpenAPI specification
#[utoipa::path(
    get,
    path = "/openapi.json",
    tag = "system",
    responses(
        (status = 200, description = "OpenAPI specification in JSON format")
    )
)]
pub async fn openapi_spec() -> impl IntoResponse {
    use crate::api::openapi::ApiDoc;
    use utoipa::OpenApi;

    Json(ApiDoc::openapi())
}

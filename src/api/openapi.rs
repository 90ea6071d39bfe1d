//! OpenAPI documentation and schema generation
//!
//! Generated at compile time with utoipa; served at `/openapi.json` and
//! browsable at `/swagger-ui` when enabled.

use utoipa::OpenApi;

/// OpenAPI documentation for the newsbrief REST API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "newsbrief REST API",
        description = "Summarize news articles into a short title, a paragraph and hashtags. \
                       Background tasks are polled by id; small articles can be summarized inline.",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development server")
    ),
    paths(
        // Tasks
        crate::api::routes::submit_summary,
        crate::api::routes::get_task,
        crate::api::routes::summarize_sync,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        crate::types::TaskId,
        crate::types::TaskStatus,
        crate::types::Summary,
        crate::types::SummaryOverrides,
        crate::types::TaskSnapshot,
        crate::types::TaskCounts,

        crate::api::routes::SummarizeRequest,
        crate::api::routes::SubmitResponse,
        crate::api::routes::SyncSummaryResponse,
        crate::api::routes::HealthResponse,

        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "tasks", description = "Summarization - submit articles, poll tasks, summarize inline"),
        (name = "system", description = "System endpoints - health check, OpenAPI spec"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Adds the bearer authentication scheme referenced by the protected routes
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = &mut openapi.components {
            components.add_security_scheme(
                "bearer",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            );
        }
    }
}

//! REST API server module
//!
//! Exposes the summarization service over HTTP with bearer authentication,
//! per-route rate limits and an OpenAPI description.

use crate::error::Error;
use crate::{Result, SummaryService};
use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod error_response;
pub mod openapi;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

use rate_limit::{LimitedRoute, RateLimiter, RouteLimit};

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Tasks (bearer token + per-route rate limit)
/// - `POST /summarize` - Queue an article, returns `202` with a task id
/// - `GET /task/:task_id` - Poll a task
/// - `POST /summarize/sync` - Summarize inline (text up to 10000 characters)
///
/// ## System (open)
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive documentation (if enabled)
///
/// On protected routes authentication runs before rate limiting, and both run
/// before the request body is parsed. Settings come from the service's own
/// configuration.
pub fn create_router(service: SummaryService) -> Router {
    let api = service.config().server.api.clone();
    let state = AppState::new(service);

    let limiter = Arc::new(RateLimiter::new(api.rate_limit.clone()));
    let limited = |route: LimitedRoute| {
        middleware::from_fn_with_state(
            RouteLimit::new(limiter.clone(), route),
            rate_limit::rate_limit_middleware,
        )
    };

    let submit = post(routes::submit_summary);
    let status = get(routes::get_task);
    let sync = post(routes::summarize_sync);
    let (submit, status, sync) = if api.rate_limit.enabled {
        (
            submit.route_layer(limited(LimitedRoute::Submit)),
            status.route_layer(limited(LimitedRoute::Status)),
            sync.route_layer(limited(LimitedRoute::Sync)),
        )
    } else {
        (submit, status, sync)
    };

    // Middleware added with route_layer on the router wraps the per-route
    // layers above, so authentication runs first
    let protected = Router::new()
        .route("/summarize", submit)
        .route("/task/:task_id", status)
        .route("/summarize/sync", sync)
        .route_layer(middleware::from_fn_with_state(
            auth::BearerPolicy::from_config(&api),
            auth::require_bearer,
        ));

    let public = Router::new()
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec));

    let public = if api.swagger_ui {
        public.merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
    } else {
        public
    };

    let router = protected
        .merge(public)
        .with_state(state)
        .layer(CatchPanicLayer::custom(error_response::panic_response))
        .layer(TraceLayer::new_for_http());

    if api.cors_enabled {
        router.layer(build_cors_layer(&api.cors_origins))
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// `"*"` (or an empty list) allows any origin; otherwise only the listed
/// origins are allowed. All methods and headers are allowed.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address
///
/// Runs until the server fails. See [`start_api_server_with_shutdown`] for a
/// server that stops on a signal.
///
/// # Example
///
/// ```no_run
/// use newsbrief::{Config, NewsSummarizer, SummaryService};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut config = Config::default();
/// config.server.api.api_key = Some("secret-key-123".into());
/// let summarizer = Arc::new(NewsSummarizer::new(&config)?);
/// let service = SummaryService::new(config, summarizer).await?;
///
/// newsbrief::api::start_api_server(service).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(service: SummaryService) -> Result<()> {
    start_api_server_with_shutdown(service, std::future::pending()).await
}

/// Start the API server and stop it once `signal` resolves
///
/// When the signal fires the service is shut down first (submissions are
/// rejected, queued work drains) while the server keeps answering polls; only
/// then does the server stop accepting connections.
pub async fn start_api_server_with_shutdown<F>(service: SummaryService, signal: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    ensure_authentication_configured(service.config())?;
    let bind_address = service.config().server.api.bind_address;
    let listener = TcpListener::bind(bind_address).await.map_err(Error::Io)?;
    serve(listener, service, signal).await
}

/// Refuse to serve protected routes that nobody could call, or that anybody could
fn ensure_authentication_configured(config: &crate::Config) -> Result<()> {
    let api = &config.server.api;
    match (&api.api_key, api.allow_unauthenticated) {
        (Some(_), _) => Ok(()),
        (None, true) => {
            tracing::warn!("No API key configured, protected routes are open (development only)");
            Ok(())
        }
        (None, false) => Err(Error::Config {
            message: "no API key configured; set API_KEY, or server.api.allow_unauthenticated \
                      for development"
                .into(),
            key: Some("server.api.api_key".into()),
        }),
    }
}

/// Serve on an already bound listener
///
/// Fails with [`Error::Config`] before serving when no API key is configured
/// and unauthenticated access was not allowed.
pub async fn serve<F>(listener: TcpListener, service: SummaryService, signal: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    ensure_authentication_configured(service.config())?;
    let address = listener.local_addr().map_err(Error::Io)?;

    let app = create_router(service.clone());

    tracing::info!(address = %address, "API server listening");

    // ConnectInfo<SocketAddr> is required by the rate limiting middleware
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        signal.await;
        service.shutdown().await;
    })
    .await
    .map_err(|e| Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

//! Bearer authentication for the protected routes
//!
//! Requests to `/summarize`, `/summarize/sync` and `/task/{id}` must carry
//! `Authorization: Bearer <key>` matching `ApiConfig::api_key`. A missing
//! header and a wrong key both yield the same `401 unauthorized` category.
//! Without a configured key every request is rejected, unless
//! `ApiConfig::allow_unauthenticated` opens the routes.

use crate::config::ApiConfig;
use crate::error::Error;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};

/// What the bearer middleware lets through
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BearerPolicy {
    /// Requests carrying exactly this secret
    Secret(String),
    /// Every request (development only)
    Open,
    /// No request: no secret is configured and open access was not allowed
    Locked,
}

impl BearerPolicy {
    /// Derive the policy from API settings
    pub fn from_config(api: &ApiConfig) -> Self {
        match (&api.api_key, api.allow_unauthenticated) {
            (Some(key), _) => BearerPolicy::Secret(key.clone()),
            (None, true) => BearerPolicy::Open,
            (None, false) => BearerPolicy::Locked,
        }
    }
}

/// Middleware that checks the bearer token against a [`BearerPolicy`]
///
/// # Examples
///
/// ```no_run
/// use axum::{Router, middleware};
/// use newsbrief::api::auth::{BearerPolicy, require_bearer};
///
/// let policy = BearerPolicy::Secret("secret-key-123".to_string());
/// let router: Router = Router::new()
///     .layer(middleware::from_fn_with_state(policy, require_bearer));
/// ```
pub async fn require_bearer(
    State(policy): State<BearerPolicy>,
    request: Request,
    next: Next,
) -> Response {
    let expected = match policy {
        BearerPolicy::Secret(expected) => expected,
        BearerPolicy::Open => return next.run(request).await,
        BearerPolicy::Locked => {
            tracing::warn!(path = %request.uri().path(), "rejected request, no API key configured");
            return Error::Unauthorized("no API key configured".into()).into_response();
        }
    };

    let provided = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token);

    match provided {
        Some(token) if constant_time_eq(token.as_bytes(), expected.as_bytes()) => {
            next.run(request).await
        }
        Some(_) => {
            tracing::debug!(path = %request.uri().path(), "rejected invalid bearer token");
            Error::Unauthorized("invalid bearer token".into()).into_response()
        }
        None => {
            tracing::debug!(path = %request.uri().path(), "rejected request without bearer token");
            Error::Unauthorized("missing bearer token".into()).into_response()
        }
    }
}

/// Extract the token from an `Authorization` header value
///
/// The scheme is matched case-insensitively; the token is taken as-is.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }
    Some(token)
}

/// Compares every byte regardless of where the first mismatch is.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

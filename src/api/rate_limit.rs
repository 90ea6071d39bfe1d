//! Per-route, per-client rate limiting
//!
//! Each limited route has its own quota (`5/minute` style), enforced as a
//! fixed window per route and client IP: the request after the N-th within a
//! window is rejected until the window closes. Exhausting one route's quota
//! does not affect another route or another client.

use crate::config::{RateLimitConfig, RateQuota};
use crate::error::Error;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, header::RETRY_AFTER},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::{
    collections::HashMap,
    net::{IpAddr, SocketAddr},
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;

/// Routes that carry a quota
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LimitedRoute {
    /// `POST /summarize`
    Submit,
    /// `GET /task/{task_id}`
    Status,
    /// `POST /summarize/sync`
    Sync,
}

impl LimitedRoute {
    fn quota(self, config: &RateLimitConfig) -> RateQuota {
        match self {
            LimitedRoute::Submit => config.submit,
            LimitedRoute::Status => config.status,
            LimitedRoute::Sync => config.sync,
        }
    }
}

/// Fixed window counter: at most `limit` requests per `period`
///
/// The window opens at the first request and closes `period` later; the next
/// request after that opens a fresh window.
struct FixedWindow {
    window_start: Instant,
    count: u32,
    limit: u32,
    period: Duration,
}

impl FixedWindow {
    fn new(quota: RateQuota, now: Instant) -> Self {
        Self {
            window_start: now,
            count: 0,
            limit: quota.requests,
            period: quota.period.duration(),
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.window_start) >= self.period
    }

    /// Count one request, or return the seconds until the window closes
    fn try_acquire(&mut self, now: Instant) -> Option<u64> {
        if self.is_expired(now) {
            self.window_start = now;
            self.count = 0;
        }

        if self.count < self.limit {
            self.count += 1;
            return None;
        }

        let remaining = self
            .period
            .saturating_sub(now.saturating_duration_since(self.window_start));
        let mut wait_secs = remaining.as_secs();
        if remaining.subsec_nanos() > 0 {
            wait_secs += 1;
        }
        Some(wait_secs.max(1))
    }
}

/// Closed windows are dropped at most this often
const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

struct Windows {
    by_client: HashMap<(LimitedRoute, IpAddr), FixedWindow>,
    last_pruned: Instant,
}

/// Rate limiter holding one window per (route, client IP)
pub struct RateLimiter {
    windows: Mutex<Windows>,
    config: RateLimitConfig,
}

impl RateLimiter {
    /// Create a limiter from configuration
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            windows: Mutex::new(Windows {
                by_client: HashMap::new(),
                last_pruned: Instant::now(),
            }),
            config,
        }
    }

    /// Check one request; `Some(seconds)` means it must be rejected
    pub async fn check(&self, route: LimitedRoute, ip: IpAddr) -> Option<u64> {
        self.check_at(route, ip, Instant::now()).await
    }

    async fn check_at(&self, route: LimitedRoute, ip: IpAddr, now: Instant) -> Option<u64> {
        if self.config.exempt_ips.contains(&ip) {
            return None;
        }

        let mut windows = self.windows.lock().await;
        if now.saturating_duration_since(windows.last_pruned) >= PRUNE_INTERVAL {
            let before = windows.by_client.len();
            windows.by_client.retain(|_, window| !window.is_expired(now));
            windows.last_pruned = now;
            tracing::trace!(
                dropped = before - windows.by_client.len(),
                "pruned closed rate limit windows"
            );
        }

        windows
            .by_client
            .entry((route, ip))
            .or_insert_with(|| FixedWindow::new(route.quota(&self.config), now))
            .try_acquire(now)
    }

    /// Number of tracked (route, client) windows
    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.windows.lock().await.by_client.len()
    }
}

/// Middleware state for one limited route
#[derive(Clone)]
pub struct RouteLimit {
    limiter: Arc<RateLimiter>,
    route: LimitedRoute,
}

impl RouteLimit {
    /// Bind a shared limiter to one route
    pub fn new(limiter: Arc<RateLimiter>, route: LimitedRoute) -> Self {
        Self { limiter, route }
    }
}

/// Rate limiting middleware
///
/// Needs `ConnectInfo<SocketAddr>`, so the server must be started with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub async fn rate_limit_middleware(
    State(limit): State<RouteLimit>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Response {
    match limit.limiter.check(limit.route, addr.ip()).await {
        None => next.run(req).await,
        Some(retry_after_seconds) => {
            tracing::debug!(
                client = %addr.ip(),
                route = ?limit.route,
                retry_after_seconds,
                "rate limit exceeded"
            );
            let mut response = Error::RateLimited {
                retry_after_seconds,
            }
            .into_response();
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(retry_after_seconds));
            response
        }
    }
}

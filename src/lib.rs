//! # newsbrief
//!
//! Turns a raw news article (title + body) into a short stylized summary: a
//! punchy title, one journalistic paragraph and a handful of hashtags.
//!
//! ## Layers
//!
//! - [`summarizer`] - text cleaning, chunking, model calls and styling
//! - [`store`] - in-memory task records with lifecycle checks and expiry
//! - [`service`] - bounded job queue, worker loops, sweeper, graceful shutdown
//! - [`api`] - REST surface with bearer auth and per-route rate limits
//! - [`client`] - typed client for the REST API
//!
//! ## Quick Start
//!
//! ```no_run
//! use newsbrief::{Config, NewsSummarizer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let summarizer = NewsSummarizer::new(&config)?;
//!
//!     let summary = summarizer
//!         .summarize_article("Bitcoin rallies", "Bitcoin climbed above $70,000 on Monday ...")
//!         .await?;
//!     println!("{}\n\n{}\n\n{}", summary.title, summary.paragraph, summary.hashtags);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Serving the API
//!
//! ```no_run
//! use newsbrief::{Config, NewsSummarizer, SummaryService};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.server.api.api_key = Some("secret-key-123".into());
//!     let summarizer = Arc::new(NewsSummarizer::new(&config)?);
//!     let service = SummaryService::new(config, summarizer).await?;
//!
//!     newsbrief::api::start_api_server_with_shutdown(service, newsbrief::wait_for_signal())
//!         .await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// REST API client
pub mod client;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Task queue, workers and lifecycle
pub mod service;
/// In-memory task store
pub mod store;
/// Article summarization pipeline
pub mod summarizer;
/// Core types
pub mod types;

// Re-export commonly used types
pub use client::NewsApiClient;
pub use config::Config;
pub use error::{ApiError, Error, ErrorDetail, ModelError, Result, TaskError, ToHttpStatus};
pub use service::{SummaryService, Submission, SyncSummary};
pub use store::TaskStore;
pub use summarizer::{ArticleSummarizer, NewsSummarizer};
pub use types::{Summary, SummaryOverrides, TaskId, TaskSnapshot, TaskStatus};

/// Wait for a termination signal, then shut the service down gracefully
///
/// Use this when the service runs without the HTTP server (library mode).
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use newsbrief::{Config, NewsSummarizer, SummaryService, run_with_shutdown};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config::default();
///     let summarizer = Arc::new(NewsSummarizer::new(&config)?);
///     let service = SummaryService::new(config, summarizer).await?;
///
///     run_with_shutdown(service).await;
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(service: SummaryService) {
    wait_for_signal().await;
    service.shutdown().await;
}

/// Resolve when SIGTERM or SIGINT (Ctrl+C elsewhere) arrives
#[cfg(unix)]
pub async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

/// Resolve when Ctrl+C arrives
#[cfg(not(unix))]
pub async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}

//! Summarization service - owns the task store, job queue and background loops
//!
//! [`SummaryService`] is the single entry point the API (and library users)
//! go through. Submissions are validated, recorded as `pending`, and handed to
//! a bounded queue drained by worker loops; a sweeper removes expired records.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::{TaskStore, TaskUpdate};
use crate::summarizer::ArticleSummarizer;
use crate::summarizer::text::clean_text;
use crate::types::{Summary, SummaryOverrides, TaskCounts, TaskId, TaskSnapshot, TaskStatus};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

mod lifecycle;
mod sweeper;
mod worker;

pub(crate) use worker::Job;

/// Minimum article length in characters, measured after cleaning
pub const MIN_TEXT_CHARS: usize = 100;
/// Maximum article length in characters for background tasks
pub const MAX_TEXT_CHARS: usize = 50_000;
/// Maximum article length in characters for inline processing
pub const MAX_SYNC_TEXT_CHARS: usize = 10_000;
/// Maximum title length in characters
pub const MAX_TITLE_CHARS: usize = 500;

/// Acknowledgement for an accepted background task
#[derive(Clone, Debug)]
pub struct Submission {
    /// New task identifier
    pub task_id: TaskId,
    /// Always `pending` at submission
    pub status: TaskStatus,
    /// Submission time
    pub created_at: DateTime<Utc>,
}

/// Result of an inline summarization
#[derive(Clone, Debug)]
pub struct SyncSummary {
    /// Generated summary
    pub summary: Summary,
    /// Seconds spent in the summarizer
    pub processing_time: f64,
}

/// Service health as reported by `GET /health`
#[derive(Clone, Copy, Debug)]
pub struct HealthStatus {
    /// Whether the summarizer can accept work
    pub model_loaded: bool,
    /// Whether new submissions are accepted
    pub accepting: bool,
    /// Record counts per status
    pub tasks: TaskCounts,
}

/// Validated article ready for the summarizer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Article {
    /// Trimmed title
    pub title: String,
    /// Cleaned body text
    pub text: String,
}

impl Article {
    /// Check title and text bounds, cleaning the text first
    ///
    /// `max_chars` bounds the raw text; the minimum applies to the cleaned
    /// text, so markup cannot pad a too-short article past the check.
    pub fn validate(title: &str, text: &str, max_chars: usize) -> Result<Self> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::validation("title", "title cannot be empty"));
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(Error::validation(
                "title",
                format!("title must be at most {MAX_TITLE_CHARS} characters"),
            ));
        }

        let raw_chars = text.chars().count();
        if raw_chars > max_chars {
            return Err(Error::validation(
                "text",
                format!("text must be at most {max_chars} characters (got {raw_chars})"),
            ));
        }

        let cleaned = clean_text(text);
        let cleaned_chars = cleaned.chars().count();
        if cleaned_chars < MIN_TEXT_CHARS {
            return Err(Error::validation(
                "text",
                format!(
                    "text must be at least {MIN_TEXT_CHARS} characters after cleaning (got {cleaned_chars})"
                ),
            ));
        }

        Ok(Self {
            title: title.to_string(),
            text: cleaned,
        })
    }
}

/// Reject override combinations the summarizer cannot honor
pub fn validate_overrides(config: &Config, overrides: &SummaryOverrides) -> Result<()> {
    if overrides.is_empty() {
        return Ok(());
    }
    config
        .summary
        .with_overrides(overrides)
        .validate()
        .map_err(|(field, message)| Error::validation(format!("config.{field}"), message))
}

/// Decrements the in-flight counter when dropped
#[derive(Debug)]
pub(crate) struct InFlightGuard(Arc<AtomicUsize>);

impl InFlightGuard {
    fn new(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter.clone())
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Handle to the running service; cheap to clone
#[derive(Clone)]
pub struct SummaryService {
    pub(crate) store: Arc<TaskStore>,
    pub(crate) summarizer: Arc<dyn ArticleSummarizer>,
    pub(crate) config: Arc<Config>,
    job_tx: mpsc::Sender<Job>,
    pub(crate) job_rx: Arc<Mutex<mpsc::Receiver<Job>>>,
    /// Cleared when shutdown begins
    pub(crate) accepting_new: Arc<AtomicBool>,
    /// Queued jobs plus running jobs plus inline requests
    pub(crate) in_flight: Arc<AtomicUsize>,
    pub(crate) cancel_token: CancellationToken,
    pub(crate) background: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl std::fmt::Debug for SummaryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummaryService")
            .field("accepting_new", &self.accepting_new.load(Ordering::SeqCst))
            .field("in_flight", &self.in_flight.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl SummaryService {
    /// Validate `config`, then start the worker loops and the sweeper
    ///
    /// Must be called from within a tokio runtime.
    pub async fn new(config: Config, summarizer: Arc<dyn ArticleSummarizer>) -> Result<Self> {
        config.validate()?;

        let store = Arc::new(TaskStore::new(config.tasks.retention()));
        let (job_tx, job_rx) = mpsc::channel(config.tasks.queue_capacity);

        let service = Self {
            store,
            summarizer,
            config: Arc::new(config),
            job_tx,
            job_rx: Arc::new(Mutex::new(job_rx)),
            accepting_new: Arc::new(AtomicBool::new(true)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            cancel_token: CancellationToken::new(),
            background: Arc::new(Mutex::new(Vec::new())),
        };

        let mut handles = Vec::with_capacity(service.config.tasks.workers + 1);
        for index in 0..service.config.tasks.workers {
            handles.push(worker::spawn_worker(index, service.clone()));
        }
        handles.push(sweeper::spawn_sweeper(
            service.store.clone(),
            service.config.tasks.sweep_interval(),
            service.cancel_token.clone(),
        ));
        *service.background.lock().await = handles;

        tracing::info!(
            workers = service.config.tasks.workers,
            queue_capacity = service.config.tasks.queue_capacity,
            retention_secs = service.config.tasks.retention_secs,
            "summary service started"
        );
        Ok(service)
    }

    /// Shared task store
    pub fn store(&self) -> &Arc<TaskStore> {
        &self.store
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether new submissions are accepted
    pub fn is_accepting(&self) -> bool {
        self.accepting_new.load(Ordering::SeqCst)
    }

    fn ensure_available(&self) -> Result<()> {
        if !self.is_accepting() {
            return Err(Error::ShuttingDown);
        }
        if !self.summarizer.is_ready() {
            return Err(Error::ServiceUnavailable(
                "summarization model is not loaded".into(),
            ));
        }
        Ok(())
    }

    /// Accept an article for background summarization
    ///
    /// The queue slot is reserved before the record is created, so a full
    /// queue never leaves an orphaned `pending` record behind. The submission
    /// counts as in flight from the first check, so shutdown waits for it.
    pub async fn submit(
        &self,
        title: &str,
        text: &str,
        overrides: SummaryOverrides,
    ) -> Result<Submission> {
        let guard = InFlightGuard::new(&self.in_flight);
        self.ensure_available()?;
        let article = Article::validate(title, text, MAX_TEXT_CHARS)?;
        validate_overrides(&self.config, &overrides)?;

        let permit = self.job_tx.try_reserve().map_err(|e| match e {
            mpsc::error::TrySendError::Full(()) => Error::QueueFull {
                capacity: self.config.tasks.queue_capacity,
            },
            mpsc::error::TrySendError::Closed(()) => Error::ShuttingDown,
        })?;

        let task_id = TaskId::new();
        let record = self
            .store
            .create(task_id, article.title.clone(), article.text.clone())
            .await?;

        // Shutdown may have started while the record was being inserted
        if !self.is_accepting() {
            let update = TaskUpdate::Fail("service shut down before the task started".into());
            if let Err(e) = self.store.update(task_id, update).await {
                tracing::debug!(task_id = %task_id, error = %e, "could not fail rejected task");
            }
            return Err(Error::ShuttingDown);
        }

        permit.send(Job {
            task_id,
            article,
            overrides,
            guard,
        });

        tracing::info!(task_id = %task_id, "task queued");
        Ok(Submission {
            task_id,
            status: record.status,
            created_at: record.created_at,
        })
    }

    /// Summarize inline without creating a task record
    pub async fn summarize_sync(
        &self,
        title: &str,
        text: &str,
        overrides: SummaryOverrides,
    ) -> Result<SyncSummary> {
        let _guard = InFlightGuard::new(&self.in_flight);
        self.ensure_available()?;
        let article = Article::validate(title, text, MAX_SYNC_TEXT_CHARS)?;
        validate_overrides(&self.config, &overrides)?;

        let started = std::time::Instant::now();
        let timeout = self.config.tasks.processing_timeout();
        let outcome = tokio::time::timeout(
            timeout,
            self.summarizer
                .summarize(&article.title, &article.text, &overrides),
        )
        .await;

        match outcome {
            Ok(Ok(summary)) => {
                let processing_time = started.elapsed().as_secs_f64();
                tracing::info!(processing_time, "inline summary completed");
                Ok(SyncSummary {
                    summary,
                    processing_time,
                })
            }
            Ok(Err(e @ Error::Validation { .. })) => Err(e),
            Ok(Err(e)) => {
                tracing::error!(error = %e, "inline summarization failed");
                Err(Error::Summarization(e.to_string()))
            }
            Err(_) => {
                tracing::error!(timeout_secs = timeout.as_secs(), "inline summarization timed out");
                Err(Error::Summarization(format!(
                    "summarization timed out after {}s",
                    timeout.as_secs()
                )))
            }
        }
    }

    /// Current state of a task
    pub async fn get_task(&self, task_id: TaskId) -> Result<TaskSnapshot> {
        Ok(self.store.get(task_id).await?.snapshot())
    }

    /// Readiness and task counts
    pub async fn health(&self) -> HealthStatus {
        HealthStatus {
            model_loaded: self.summarizer.is_ready(),
            accepting: self.is_accepting(),
            tasks: self.store.counts().await,
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

//! Shared test helpers: stub summarizers and service construction.

use super::SummaryService;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::summarizer::ArticleSummarizer;
use crate::types::{Summary, SummaryOverrides, TaskId, TaskSnapshot, TaskStatus};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;

/// A cleaned article comfortably above the minimum length
pub(crate) const ARTICLE_TEXT: &str = "Bitcoin climbed above $70,000 on Monday as inflows into \
    spot exchange-traded funds hit a record. Traders said momentum across the crypto market was \
    the strongest since March, with Ethereum also posting gains.";

pub(crate) fn sample_summary() -> Summary {
    Summary {
        title: "Bitcoin Climbs Above $70,000".into(),
        paragraph: "Bitcoin climbed above $70,000 on Monday.".into(),
        hashtags: "#Bitcoin #Crypto #News".into(),
    }
}

/// Config with short timeouts suitable for tests
pub(crate) fn test_config() -> Config {
    let mut config = Config::default();
    config.tasks.workers = 1;
    config.tasks.queue_capacity = 8;
    config.tasks.processing_timeout_secs = 5;
    config.tasks.drain_timeout_secs = 2;
    config.models.sentiment_model = None;
    config
}

pub(crate) async fn start_service(summarizer: Arc<dyn ArticleSummarizer>) -> SummaryService {
    SummaryService::new(test_config(), summarizer).await.unwrap()
}

/// Poll until the task reaches `status` or `timeout` elapses
pub(crate) async fn wait_for_status(
    service: &SummaryService,
    task_id: TaskId,
    status: TaskStatus,
    timeout: Duration,
) -> TaskSnapshot {
    tokio::time::timeout(timeout, async {
        loop {
            let snapshot = service.get_task(task_id).await.unwrap();
            if snapshot.status == status {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("task {task_id} did not reach {status} within {timeout:?}"))
}

/// Always returns the same summary
#[derive(Default)]
pub(crate) struct FixedSummarizer {
    pub calls: AtomicUsize,
}

#[async_trait]
impl ArticleSummarizer for FixedSummarizer {
    async fn summarize(&self, _: &str, _: &str, _: &SummaryOverrides) -> Result<Summary> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(sample_summary())
    }
}

/// Always fails with the given message
pub(crate) struct FailingSummarizer(pub &'static str);

#[async_trait]
impl ArticleSummarizer for FailingSummarizer {
    async fn summarize(&self, _: &str, _: &str, _: &SummaryOverrides) -> Result<Summary> {
        Err(Error::Summarization(self.0.to_string()))
    }
}

/// Blocks each call until [`GatedSummarizer::release`] hands out a permit
pub(crate) struct GatedSummarizer {
    gate: Semaphore,
    pub started: AtomicUsize,
}

impl GatedSummarizer {
    pub fn new() -> Self {
        Self {
            gate: Semaphore::new(0),
            started: AtomicUsize::new(0),
        }
    }

    /// Let `n` blocked calls finish
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    /// Wait until at least `n` calls have started
    pub async fn wait_started(&self, n: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.started.load(Ordering::SeqCst) < n {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("summarizer call started");
    }
}

#[async_trait]
impl ArticleSummarizer for GatedSummarizer {
    async fn summarize(&self, _: &str, _: &str, _: &SummaryOverrides) -> Result<Summary> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| Error::Internal(e.to_string()))?;
        permit.forget();
        Ok(sample_summary())
    }
}

/// Sleeps before answering
pub(crate) struct SlowSummarizer(pub Duration);

#[async_trait]
impl ArticleSummarizer for SlowSummarizer {
    async fn summarize(&self, _: &str, _: &str, _: &SummaryOverrides) -> Result<Summary> {
        tokio::time::sleep(self.0).await;
        Ok(sample_summary())
    }
}

/// Panics on every call
pub(crate) struct PanickingSummarizer;

#[async_trait]
impl ArticleSummarizer for PanickingSummarizer {
    async fn summarize(&self, _: &str, _: &str, _: &SummaryOverrides) -> Result<Summary> {
        panic!("model runtime crashed");
    }
}

/// Reports not ready
pub(crate) struct NotReadySummarizer;

#[async_trait]
impl ArticleSummarizer for NotReadySummarizer {
    async fn summarize(&self, _: &str, _: &str, _: &SummaryOverrides) -> Result<Summary> {
        Ok(sample_summary())
    }

    fn is_ready(&self) -> bool {
        false
    }
}

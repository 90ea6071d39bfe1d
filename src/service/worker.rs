//! Worker loops - pull jobs from the queue and run the summarizer

use super::{Article, InFlightGuard, SummaryService};
use crate::store::TaskUpdate;
use crate::types::{SummaryOverrides, TaskId};
use tokio::task::JoinHandle;

/// One queued summarization
#[derive(Debug)]
pub(crate) struct Job {
    pub task_id: TaskId,
    pub article: Article,
    pub overrides: SummaryOverrides,
    /// Released when the job is finished or dropped
    pub guard: InFlightGuard,
}

/// Spawn a worker that processes jobs until the service is cancelled or the queue closes
pub(super) fn spawn_worker(index: usize, service: SummaryService) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::debug!(worker = index, "worker started");
        loop {
            let next = tokio::select! {
                biased;
                _ = service.cancel_token.cancelled() => None,
                job = async { service.job_rx.lock().await.recv().await } => job,
            };

            let Some(job) = next else {
                break;
            };
            process_job(&service, job).await;
        }
        tracing::debug!(worker = index, "worker stopped");
    })
}

/// Drive one job through `processing` to a terminal state
///
/// The summarizer runs in its own task so that a panic or a hang is contained:
/// a panic fails the task, a hang is cut off by the processing timeout, and
/// cancellation aborts it.
async fn process_job(service: &SummaryService, job: Job) {
    let Job {
        task_id,
        article,
        overrides,
        guard: _guard,
    } = job;

    if let Err(e) = service.store.update(task_id, TaskUpdate::Start).await {
        // Record expired or was failed during shutdown; nothing left to do
        tracing::warn!(task_id = %task_id, error = %e, "could not start task");
        return;
    }
    tracing::info!(task_id = %task_id, "task processing started");

    let summarizer = service.summarizer.clone();
    let mut call = tokio::spawn(async move {
        summarizer
            .summarize(&article.title, &article.text, &overrides)
            .await
    });

    let timeout = service.config.tasks.processing_timeout();
    let update = tokio::select! {
        joined = tokio::time::timeout(timeout, &mut call) => match joined {
            Ok(Ok(Ok(summary))) => TaskUpdate::Complete(summary),
            Ok(Ok(Err(e))) => TaskUpdate::Fail(e.to_string()),
            Ok(Err(join_error)) if join_error.is_panic() => {
                TaskUpdate::Fail("summarizer panicked".to_string())
            }
            Ok(Err(_)) => TaskUpdate::Fail("summarization was aborted".to_string()),
            Err(_) => {
                call.abort();
                TaskUpdate::Fail(format!(
                    "summarization timed out after {}s",
                    timeout.as_secs()
                ))
            }
        },
        _ = service.cancel_token.cancelled() => {
            call.abort();
            TaskUpdate::Fail("service shut down before the task finished".to_string())
        }
    };

    if let TaskUpdate::Fail(error) = &update {
        tracing::warn!(task_id = %task_id, error = %error, "task failed");
    }

    match service.store.update(task_id, update).await {
        Ok(record) => tracing::info!(
            task_id = %task_id,
            status = %record.status,
            processing_time = record.processing_time,
            "task finished"
        ),
        Err(e) => tracing::warn!(task_id = %task_id, error = %e, "could not record task outcome"),
    }
}

//! In-memory task store
//!
//! The store is the only shared mutable state in the service. Every lifecycle
//! transition runs under a single write lock, and readers only ever get
//! cloned records, so a reader never observes a half-applied update.

use crate::error::TaskError;
use crate::types::{Summary, TaskCounts, TaskId, TaskRecord, TaskStatus};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

/// A single lifecycle transition applied by [`TaskStore::update`]
#[derive(Clone, Debug)]
pub enum TaskUpdate {
    /// `pending → processing`
    Start,
    /// `processing → completed`
    Complete(Summary),
    /// `{pending, processing} → failed`
    Fail(String),
}

impl TaskUpdate {
    fn target(&self) -> TaskStatus {
        match self {
            TaskUpdate::Start => TaskStatus::Processing,
            TaskUpdate::Complete(_) => TaskStatus::Completed,
            TaskUpdate::Fail(_) => TaskStatus::Failed,
        }
    }
}

/// Map from task identifier to task record, with time-based expiry
#[derive(Debug)]
pub struct TaskStore {
    records: RwLock<HashMap<TaskId, TaskRecord>>,
    retention: Duration,
}

impl TaskStore {
    /// Create an empty store whose records expire `retention` after creation
    pub fn new(retention: Duration) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            retention,
        }
    }

    /// Retention window applied by reads and sweeps
    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Insert a new `pending` record created now
    pub async fn create(
        &self,
        task_id: TaskId,
        title: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<TaskRecord, TaskError> {
        self.create_at(task_id, title, text, Utc::now()).await
    }

    /// Insert a new `pending` record with an explicit creation time
    pub async fn create_at(
        &self,
        task_id: TaskId,
        title: impl Into<String>,
        text: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<TaskRecord, TaskError> {
        let mut records = self.records.write().await;
        if records.contains_key(&task_id) {
            return Err(TaskError::Duplicate { id: task_id });
        }
        let record = TaskRecord::new(task_id, title, text, now);
        records.insert(task_id, record.clone());
        tracing::debug!(task_id = %task_id, "task record created");
        Ok(record)
    }

    /// Look up a live record
    pub async fn get(&self, task_id: TaskId) -> Result<TaskRecord, TaskError> {
        self.get_at(task_id, Utc::now()).await
    }

    /// Look up a record as of `now`; records past retention read as not found
    pub async fn get_at(
        &self,
        task_id: TaskId,
        now: DateTime<Utc>,
    ) -> Result<TaskRecord, TaskError> {
        let records = self.records.read().await;
        records
            .get(&task_id)
            .filter(|record| !self.is_expired(record, now))
            .cloned()
            .ok_or(TaskError::NotFound { id: task_id })
    }

    /// Apply one lifecycle transition atomically and return the updated record
    ///
    /// A rejected transition leaves the record unchanged.
    pub async fn update(
        &self,
        task_id: TaskId,
        update: TaskUpdate,
    ) -> Result<TaskRecord, TaskError> {
        let now = Utc::now();
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&task_id)
            .ok_or(TaskError::NotFound { id: task_id })?;

        // Validate first so a failed transition never writes partial fields
        let target = update.target();
        if !record.status.can_transition_to(target) {
            return Err(TaskError::InvalidTransition {
                id: task_id,
                from: record.status,
                to: target,
            });
        }

        match update {
            TaskUpdate::Start => record.start(now)?,
            TaskUpdate::Complete(summary) => record.complete(summary, now)?,
            TaskUpdate::Fail(error) => record.fail(error, now)?,
        }

        tracing::debug!(task_id = %task_id, status = %record.status, "task status updated");
        Ok(record.clone())
    }

    /// Remove every record created before `now - retention`
    ///
    /// Returns the number of records removed.
    pub async fn sweep(&self, now: DateTime<Utc>, retention: Duration) -> usize {
        let cutoff = cutoff(now, retention);
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| record.created_at >= cutoff);
        let removed = before - records.len();

        if removed > 0 {
            tracing::info!(removed, remaining = records.len(), "expired task records removed");
        }
        removed
    }

    /// Number of records currently held, expired or not
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store holds no records
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Per-status record counts
    pub async fn counts(&self) -> TaskCounts {
        let records = self.records.read().await;
        records
            .values()
            .fold(TaskCounts::default(), |mut counts, record| {
                match record.status {
                    TaskStatus::Pending => counts.pending += 1,
                    TaskStatus::Processing => counts.processing += 1,
                    TaskStatus::Completed => counts.completed += 1,
                    TaskStatus::Failed => counts.failed += 1,
                }
                counts
            })
    }

    /// Hold the write lock, stalling every other store operation
    #[cfg(test)]
    pub(crate) async fn lock_exclusive(
        &self,
    ) -> tokio::sync::RwLockWriteGuard<'_, HashMap<TaskId, TaskRecord>> {
        self.records.write().await
    }

    fn is_expired(&self, record: &TaskRecord, now: DateTime<Utc>) -> bool {
        record.created_at < cutoff(now, self.retention)
    }
}

fn cutoff(now: DateTime<Utc>, retention: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(retention)
        .ok()
        .and_then(|r| now.checked_sub_signed(r))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const HOUR: Duration = Duration::from_secs(3600);

    fn summary() -> Summary {
        Summary {
            title: "Markets Rally".into(),
            paragraph: "Stocks closed higher.".into(),
            hashtags: "#Stocks #News".into(),
        }
    }

    #[tokio::test]
    async fn create_then_get_returns_pending_record() {
        let store = TaskStore::new(HOUR);
        let id = TaskId::new();
        store.create(id, "Title", "Body text").await.unwrap();

        let record = store.get(id).await.unwrap();
        assert_eq!(record.task_id, id);
        assert_eq!(record.status, TaskStatus::Pending);
        assert_eq!(record.title, "Title");
        assert!(record.started_at.is_none());
    }

    #[tokio::test]
    async fn duplicate_create_is_rejected() {
        let store = TaskStore::new(HOUR);
        let id = TaskId::new();
        store.create(id, "A", "a").await.unwrap();
        let err = store.create(id, "B", "b").await.unwrap_err();
        assert!(matches!(err, TaskError::Duplicate { .. }));
        assert_eq!(store.get(id).await.unwrap().title, "A");
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let store = TaskStore::new(HOUR);
        let err = store.get(TaskId::new()).await.unwrap_err();
        assert!(matches!(err, TaskError::NotFound { .. }));
    }

    #[tokio::test]
    async fn full_lifecycle_through_update() {
        let store = TaskStore::new(HOUR);
        let id = TaskId::new();
        store.create(id, "T", "text").await.unwrap();

        let started = store.update(id, TaskUpdate::Start).await.unwrap();
        assert_eq!(started.status, TaskStatus::Processing);
        assert!(started.started_at.is_some());

        let done = store
            .update(id, TaskUpdate::Complete(summary()))
            .await
            .unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        assert_eq!(done.summary, Some(summary()));
        assert!(done.processing_time.unwrap() >= 0.0);
        assert!(done.completed_at.unwrap() >= done.started_at.unwrap());
    }

    #[tokio::test]
    async fn rejected_transition_leaves_record_untouched() {
        let store = TaskStore::new(HOUR);
        let id = TaskId::new();
        store.create(id, "T", "text").await.unwrap();

        // pending cannot complete without starting
        let err = store
            .update(id, TaskUpdate::Complete(summary()))
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::InvalidTransition { .. }));

        store.update(id, TaskUpdate::Start).await.unwrap();
        store
            .update(id, TaskUpdate::Fail("boom".into()))
            .await
            .unwrap();

        assert!(store.update(id, TaskUpdate::Start).await.is_err());
        assert!(
            store
                .update(id, TaskUpdate::Complete(summary()))
                .await
                .is_err()
        );

        let record = store.get(id).await.unwrap();
        assert_eq!(record.status, TaskStatus::Failed);
        assert_eq!(record.error.as_deref(), Some("boom"));
        assert!(record.summary.is_none());
    }

    #[tokio::test]
    async fn pending_task_can_fail_directly() {
        let store = TaskStore::new(HOUR);
        let id = TaskId::new();
        store.create(id, "T", "text").await.unwrap();
        let record = store
            .update(id, TaskUpdate::Fail("service shutting down".into()))
            .await
            .unwrap();
        assert_eq!(record.status, TaskStatus::Failed);
        assert!(record.started_at.is_none());
    }

    #[tokio::test]
    async fn expired_records_read_as_not_found_before_sweep() {
        let store = TaskStore::new(HOUR);
        let id = TaskId::new();
        let two_hours_ago = Utc::now() - chrono::Duration::hours(2);
        store.create_at(id, "Old", "text", two_hours_ago).await.unwrap();

        assert_eq!(store.len().await, 1);
        assert!(matches!(
            store.get(id).await.unwrap_err(),
            TaskError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_records() {
        let store = TaskStore::new(HOUR);
        let now = Utc::now();
        let old = TaskId::new();
        let fresh = TaskId::new();
        store
            .create_at(old, "Old", "text", now - chrono::Duration::minutes(61))
            .await
            .unwrap();
        store
            .create_at(fresh, "Fresh", "text", now - chrono::Duration::minutes(59))
            .await
            .unwrap();

        let removed = store.sweep(now, HOUR).await;
        assert_eq!(removed, 1);
        assert_eq!(store.len().await, 1);
        assert!(store.get(fresh).await.is_ok());
        assert!(store.get(old).await.is_err());
    }

    #[tokio::test]
    async fn sweep_ignores_status() {
        let store = TaskStore::new(HOUR);
        let now = Utc::now();
        let id = TaskId::new();
        store
            .create_at(id, "T", "text", now - chrono::Duration::hours(3))
            .await
            .unwrap();
        store.update(id, TaskUpdate::Start).await.unwrap();

        assert_eq!(store.sweep(now, HOUR).await, 1);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn counts_track_each_status() {
        let store = TaskStore::new(HOUR);
        let ids: Vec<TaskId> = (0..4).map(|_| TaskId::new()).collect();
        for id in &ids {
            store.create(*id, "T", "text").await.unwrap();
        }
        store.update(ids[1], TaskUpdate::Start).await.unwrap();
        store.update(ids[2], TaskUpdate::Start).await.unwrap();
        store
            .update(ids[2], TaskUpdate::Complete(summary()))
            .await
            .unwrap();
        store
            .update(ids[3], TaskUpdate::Fail("x".into()))
            .await
            .unwrap();

        assert_eq!(
            store.counts().await,
            TaskCounts {
                pending: 1,
                processing: 1,
                completed: 1,
                failed: 1,
            }
        );
    }

    #[tokio::test]
    async fn concurrent_readers_see_whole_transitions() {
        let store = Arc::new(TaskStore::new(HOUR));
        let id = TaskId::new();
        store.create(id, "T", "text").await.unwrap();

        let reader = {
            let store = store.clone();
            tokio::spawn(async move {
                for _ in 0..200 {
                    let record = store.get(id).await.unwrap();
                    match record.status {
                        TaskStatus::Completed => {
                            assert!(record.summary.is_some());
                            assert!(record.processing_time.is_some());
                        }
                        TaskStatus::Processing => assert!(record.started_at.is_some()),
                        _ => {}
                    }
                    tokio::task::yield_now().await;
                }
            })
        };

        store.update(id, TaskUpdate::Start).await.unwrap();
        tokio::task::yield_now().await;
        store
            .update(id, TaskUpdate::Complete(summary()))
            .await
            .unwrap();

        reader.await.unwrap();
    }
}

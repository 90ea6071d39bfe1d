//! Core types for newsbrief

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::TaskError;

/// Unique identifier for a summarization task
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct TaskId(pub Uuid);

impl TaskId {
    /// Generate a fresh random identifier
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID value
    pub fn get(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for TaskId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Task lifecycle status
///
/// Transitions only move forward: `pending → processing → {completed, failed}`.
/// A pending task may also fail directly (e.g. dropped during shutdown).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Accepted and waiting for a worker
    Pending,
    /// A worker is running the summarizer
    Processing,
    /// Summary available
    Completed,
    /// Summarization failed; see `error`
    Failed,
}

impl TaskStatus {
    /// Whether no further transition is allowed
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    /// Whether moving from `self` to `next` is a legal lifecycle step
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::Processing)
                | (TaskStatus::Pending, TaskStatus::Failed)
                | (TaskStatus::Processing, TaskStatus::Completed)
                | (TaskStatus::Processing, TaskStatus::Failed)
        )
    }

    /// Lowercase wire name
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stylized article summary
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Summary {
    /// Short headline (at most `max_title_words` words)
    pub title: String,
    /// Journalistic paragraph with trading commentary
    pub paragraph: String,
    /// Space-separated hashtags, e.g. `"#Bitcoin #Crypto #News"`
    pub hashtags: String,
}

/// Per-request overrides of [`crate::config::SummaryConfig`]
///
/// Unknown keys are rejected so typos surface as validation errors instead of
/// being silently ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct SummaryOverrides {
    /// Token budget per chunk fed to the summarization model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_chunk_tokens: Option<usize>,
    /// Minimum number of hashtags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_hashtags: Option<usize>,
    /// Maximum number of hashtags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_hashtags: Option<usize>,
    /// Maximum words in the generated title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_title_words: Option<usize>,
    /// Summarization model identifier on the hub
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
}

impl SummaryOverrides {
    /// True when no field is set
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Full task record as held by the [`crate::store::TaskStore`]
#[derive(Clone, Debug)]
pub struct TaskRecord {
    /// Task identifier
    pub task_id: TaskId,
    /// Current lifecycle status
    pub status: TaskStatus,
    /// Submission time
    pub created_at: DateTime<Utc>,
    /// When a worker picked the task up
    pub started_at: Option<DateTime<Utc>>,
    /// When the task reached a terminal state
    pub completed_at: Option<DateTime<Utc>>,
    /// Submitted article title
    pub title: String,
    /// Submitted (cleaned) article text
    pub text: String,
    /// Result, only when completed
    pub summary: Option<Summary>,
    /// Failure message, only when failed
    pub error: Option<String>,
    /// Seconds between `started_at` and `completed_at`, only when completed
    pub processing_time: Option<f64>,
}

impl TaskRecord {
    /// New pending record
    pub fn new(
        task_id: TaskId,
        title: impl Into<String>,
        text: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id,
            status: TaskStatus::Pending,
            created_at: now,
            started_at: None,
            completed_at: None,
            title: title.into(),
            text: text.into(),
            summary: None,
            error: None,
            processing_time: None,
        }
    }

    fn advance(&mut self, next: TaskStatus) -> Result<(), TaskError> {
        if !self.status.can_transition_to(next) {
            return Err(TaskError::InvalidTransition {
                id: self.task_id,
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// `pending → processing`
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), TaskError> {
        self.advance(TaskStatus::Processing)?;
        self.started_at = Some(now);
        Ok(())
    }

    /// `processing → completed`
    pub fn complete(&mut self, summary: Summary, now: DateTime<Utc>) -> Result<(), TaskError> {
        self.advance(TaskStatus::Completed)?;
        let started = self.started_at.unwrap_or(now);
        self.summary = Some(summary);
        self.completed_at = Some(now);
        self.processing_time = Some(
            (now - started)
                .to_std()
                .map(|d| d.as_secs_f64())
                .unwrap_or(0.0),
        );
        Ok(())
    }

    /// `{pending, processing} → failed`
    pub fn fail(&mut self, error: impl Into<String>, now: DateTime<Utc>) -> Result<(), TaskError> {
        self.advance(TaskStatus::Failed)?;
        self.error = Some(error.into());
        self.completed_at = Some(now);
        Ok(())
    }

    /// Client-facing view of this record
    pub fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            task_id: self.task_id,
            status: self.status,
            summary: self.summary.clone(),
            error: self.error.clone(),
            processing_time: self.processing_time,
            created_at: self.created_at,
            started_at: self.started_at,
            completed_at: self.completed_at,
        }
    }
}

/// Task state as returned by `GET /task/{task_id}`
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskSnapshot {
    /// Task identifier
    pub task_id: TaskId,
    /// Current status
    pub status: TaskStatus,
    /// Summary (completed tasks only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
    /// Error message (failed tasks only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Processing time in seconds (completed tasks only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,
    /// Submission time
    pub created_at: DateTime<Utc>,
    /// Processing start time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// Terminal state time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Per-status record counts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TaskCounts {
    /// Waiting for a worker
    pub pending: usize,
    /// Being summarized
    pub processing: usize,
    /// Finished successfully
    pub completed: usize,
    /// Finished with an error
    pub failed: usize,
}

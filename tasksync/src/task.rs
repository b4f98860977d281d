//! Task records and the values that travel alongside them.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a task: the creation wall-clock time in milliseconds.
///
/// Unique within one local collection. Two devices creating tasks offline in
/// the same millisecond will collide; merges treat them as the same record.
pub type TaskId = i64;

/// A dated task, as stored locally and remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    /// Scheduled moment, serialized as RFC 3339.
    pub date: DateTime<Utc>,
    pub completed: bool,
    /// `true` once the record is known to exist in the remote store.
    #[serde(default)]
    pub synced: bool,
}

impl Task {
    /// Build a task from a validated draft.
    pub fn from_draft(id: TaskId, draft: TaskDraft, synced: bool) -> Self {
        Self {
            id,
            title: draft.title,
            date: draft.date,
            completed: draft.completed,
            synced,
        }
    }
}

/// Rejected user input for a new task.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Task title must not be empty")]
    EmptyTitle,

    #[error("Invalid task date '{0}': expected YYYY-MM-DDTHH:MM")]
    InvalidDate(String),
}

/// User input for a task that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    title: String,
    date: DateTime<Utc>,
    completed: bool,
}

impl TaskDraft {
    pub fn new(
        title: impl Into<String>,
        date: DateTime<Utc>,
        completed: bool,
    ) -> Result<Self, ValidationError> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        Ok(Self {
            title,
            date,
            completed,
        })
    }

    /// Parse a `datetime-local` style value (`YYYY-MM-DDTHH:MM`, seconds
    /// optional) interpreted in `offset`.
    pub fn parse_local(
        title: impl Into<String>,
        datetime: &str,
        offset: FixedOffset,
        completed: bool,
    ) -> Result<Self, ValidationError> {
        let raw = datetime.trim();
        let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
            .map_err(|_| ValidationError::InvalidDate(raw.to_string()))?;
        let date = offset
            .from_local_datetime(&naive)
            .single()
            .ok_or_else(|| ValidationError::InvalidDate(raw.to_string()))?
            .with_timezone(&Utc);
        Self::new(title, date, completed)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn completed(&self) -> bool {
        self.completed
    }
}

/// Lightweight event broadcast whenever the in-memory task view is replaced.
///
/// Front ends subscribe via [`TaskSync::change_rx()`](crate::TaskSync::change_rx)
/// and re-render on receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeNotification {
    /// Number of tasks in the new view.
    pub task_count: usize,
}

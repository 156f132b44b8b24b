//! Core types for log-export

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Opaque identifier for an export task
///
/// Generated once at submission time from a random UUID. Callers treat it as an
/// opaque string; any string can be looked up, unknown ones resolve to
/// [`TaskStatus::NotFound`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Generate a fresh, process-unique task id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Export task status
///
/// Transitions are monotonic: `Pending -> Processing -> {Completed | Failed}`.
/// `NotFound` is synthetic and never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Accepted, waiting for a worker
    Pending,
    /// A worker is extracting and writing the artifact
    Processing,
    /// Artifact written; `result_file` is set
    Completed,
    /// Export failed; `message` is set
    Failed,
    /// Unknown or expired task id
    NotFound,
}

impl TaskStatus {
    /// Whether no further transitions can happen from this status
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::NotFound
        )
    }

    /// Whether `self -> next` is a legal transition for a stored task
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::Processing)
                | (TaskStatus::Pending, TaskStatus::Failed)
                | (TaskStatus::Processing, TaskStatus::Completed)
                | (TaskStatus::Processing, TaskStatus::Failed)
        )
    }

    /// Wire name of the status (e.g. `"PROCESSING"`)
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Processing => "PROCESSING",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Failed => "FAILED",
            TaskStatus::NotFound => "NOT_FOUND",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status transition together with the detail it carries
///
/// Completion always names an artifact and failure always carries a reason, so a
/// stored task can never end up with both or neither once terminal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskUpdate {
    /// Worker picked the task up
    Processing,
    /// Artifact written under the given file name
    Completed {
        /// File name of the artifact inside the output directory
        result_file: String,
    },
    /// Export failed with a human-readable reason
    Failed {
        /// Failure reason
        message: String,
    },
}

impl TaskUpdate {
    /// Status this update moves the task into
    pub fn status(&self) -> TaskStatus {
        match self {
            TaskUpdate::Processing => TaskStatus::Processing,
            TaskUpdate::Completed { .. } => TaskStatus::Completed,
            TaskUpdate::Failed { .. } => TaskStatus::Failed,
        }
    }
}

/// One export request and its tracked lifecycle
#[derive(Clone, Debug, PartialEq)]
pub struct Task {
    /// Task id (immutable)
    pub id: TaskId,
    /// Current status
    pub status: TaskStatus,
    /// When the task was submitted (immutable)
    pub created_at: DateTime<Utc>,
    /// When the status last changed
    pub last_updated: DateTime<Utc>,
    /// Failure reason, only when `Failed`
    pub message: Option<String>,
    /// Artifact file name, only when `Completed`
    pub result_file: Option<String>,
}

impl Task {
    /// New pending task created now
    pub fn pending(id: TaskId) -> Self {
        let now = Utc::now();
        Self {
            id,
            status: TaskStatus::Pending,
            created_at: now,
            last_updated: now,
            message: None,
            result_file: None,
        }
    }

    /// Synthetic record returned for ids the store does not know
    ///
    /// Timestamps are pinned to the epoch so repeated lookups compare equal;
    /// snapshots omit them.
    pub fn not_found(id: TaskId) -> Self {
        Self {
            id,
            status: TaskStatus::NotFound,
            created_at: DateTime::default(),
            last_updated: DateTime::default(),
            message: None,
            result_file: None,
        }
    }

    /// Apply an update if the transition is legal
    ///
    /// Returns `false` and leaves the task untouched otherwise.
    pub fn apply(&mut self, update: TaskUpdate) -> bool {
        if !self.status.can_transition_to(update.status()) {
            return false;
        }

        self.status = update.status();
        self.last_updated = Utc::now();
        match update {
            TaskUpdate::Processing => {}
            TaskUpdate::Completed { result_file } => self.result_file = Some(result_file),
            TaskUpdate::Failed { message } => self.message = Some(message),
        }
        true
    }
}

/// Status query result returned to callers
///
/// Serialized in camelCase to match the HTTP contract:
///
/// ```json
/// {
///   "taskId": "6f1c...",
///   "status": "COMPLETED",
///   "createdAt": "2024-01-01T10:00:00Z",
///   "lastUpdated": "2024-01-01T10:00:01Z",
///   "resultFile": "log-2024-01-01-6f1c....txt"
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskSnapshot {
    /// Task id
    pub task_id: TaskId,
    /// Current status
    pub status: TaskStatus,
    /// Submission timestamp (absent for `NOT_FOUND`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last transition timestamp (absent for `NOT_FOUND`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    /// Failure reason (only for `FAILED`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Artifact file name (only for `COMPLETED`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_file: Option<String>,
    /// Progress hint while the task is being processed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<String>,
}

impl From<Task> for TaskSnapshot {
    fn from(task: Task) -> Self {
        let known = task.status != TaskStatus::NotFound;
        let created_at = known.then_some(task.created_at);
        let last_updated = known.then_some(task.last_updated);
        let progress = (task.status == TaskStatus::Processing)
            .then(|| "File is being processed".to_string());

        Self {
            task_id: task.id,
            status: task.status,
            created_at,
            last_updated,
            message: task.message,
            result_file: task.result_file,
            progress,
        }
    }
}

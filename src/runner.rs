//! Background execution of export tasks.
//!
//! Each submitted task is handed to [`TaskRunner::spawn`], which queues it on a
//! bounded pool (a semaphore sized by `max_concurrent_tasks`) and runs the
//! blocking extraction on tokio's blocking threads. The runner is the only writer
//! of a task after submission and drives it through
//! `PENDING -> PROCESSING -> {COMPLETED | FAILED}`.
//!
//! Every outcome, including a panicking job, is recorded on the task; nothing
//! escapes the worker.

use crate::error::{Error, ExtractionError, Result};
use crate::extractor;
use crate::store::TaskStore;
use crate::types::{TaskId, TaskUpdate};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

/// File name of the artifact for `date` produced by task `id`
///
/// Unique per task, so concurrent exports of the same date never collide.
pub fn artifact_name(date: &str, id: &TaskId) -> String {
    format!("log-{date}-{id}.txt")
}

/// Runs export jobs on a bounded worker pool
#[derive(Clone, Debug)]
pub struct TaskRunner {
    store: Arc<TaskStore>,
    source_log: Arc<PathBuf>,
    output_dir: Arc<PathBuf>,
    workers: Arc<Semaphore>,
    tracker: TaskTracker,
}

impl TaskRunner {
    /// Create a runner writing artifacts from `source_log` into `output_dir`
    pub fn new(
        store: Arc<TaskStore>,
        source_log: PathBuf,
        output_dir: PathBuf,
        max_concurrent_tasks: usize,
    ) -> Self {
        Self {
            store,
            source_log: Arc::new(source_log),
            output_dir: Arc::new(output_dir),
            workers: Arc::new(Semaphore::new(max_concurrent_tasks.max(1))),
            tracker: TaskTracker::new(),
        }
    }

    /// Schedule the export of `date` for task `id`
    ///
    /// Returns immediately; the task moves to PROCESSING once a worker slot frees
    /// up.
    pub fn spawn(&self, id: TaskId, date: String) -> JoinHandle<()> {
        let source_log = self.source_log.clone();
        let output_dir = self.output_dir.clone();
        let job_id = id.clone();

        self.spawn_job(id, move || export(&source_log, &output_dir, &job_id, &date))
    }

    /// Schedule an arbitrary blocking job for task `id`
    ///
    /// `job` returns the artifact file name on success.
    pub(crate) fn spawn_job<F>(&self, id: TaskId, job: F) -> JoinHandle<()>
    where
        F: FnOnce() -> Result<String> + Send + 'static,
    {
        let store = self.store.clone();
        let workers = self.workers.clone();
        let output_dir = self.output_dir.clone();

        self.tracker.spawn(async move {
            let _permit = match workers.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    store.update(
                        &id,
                        TaskUpdate::Failed {
                            message: "worker pool closed".into(),
                        },
                    );
                    return;
                }
            };

            if !store.update(&id, TaskUpdate::Processing) {
                // swept while queued
                tracing::debug!(task_id = %id, "Export task no longer pending, skipping");
                return;
            }
            tracing::debug!(task_id = %id, "Export task processing");

            let update = match tokio::task::spawn_blocking(job).await {
                Ok(Ok(result_file)) => {
                    tracing::info!(task_id = %id, result_file = %result_file, "Export task completed");
                    TaskUpdate::Completed { result_file }
                }
                Ok(Err(e)) => {
                    let message = failure_message(e);
                    tracing::warn!(task_id = %id, reason = %message, "Export task failed");
                    TaskUpdate::Failed { message }
                }
                Err(join_err) => {
                    let message = if join_err.is_panic() {
                        format!("worker panicked: {}", panic_message(join_err.into_panic()))
                    } else {
                        "worker aborted".to_string()
                    };
                    tracing::error!(task_id = %id, reason = %message, "Export worker fault");
                    TaskUpdate::Failed { message }
                }
            };

            let artifact = match &update {
                TaskUpdate::Completed { result_file } => Some(output_dir.join(result_file)),
                _ => None,
            };
            if !store.update(&id, update) {
                if let Some(path) = artifact {
                    tracing::debug!(task_id = %id, path = %path.display(), "Task swept during export, removing artifact");
                    if let Err(e) = tokio::fs::remove_file(&path).await {
                        tracing::warn!(task_id = %id, path = %path.display(), error = %e, "Failed to remove orphaned artifact");
                    }
                }
            }
        })
    }

    /// Number of jobs spawned and not yet finished
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Wait until every spawned job has recorded its outcome
    ///
    /// New jobs may still be spawned while waiting; they are waited for too.
    pub async fn wait_idle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}

/// Blocking export body: validate, extract, write
fn export(source: &Path, output_dir: &Path, id: &TaskId, date: &str) -> Result<String> {
    extractor::parse_calendar_date(date)?;

    let lines = extractor::extract(source, date)?;
    if lines.is_empty() {
        return Err(ExtractionError::EmptyResult {
            date: date.to_string(),
        }
        .into());
    }

    let file_name = artifact_name(date, id);
    let path = output_dir.join(&file_name);
    let file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)?;
    let guard = PartialArtifact::new(path);

    let mut writer = BufWriter::new(file);
    for line in &lines {
        writeln!(writer, "{line}")?;
    }
    writer.flush()?;
    writer.get_ref().sync_all()?;
    guard.keep();

    tracing::debug!(task_id = %id, date, lines = lines.len(), "Artifact written");
    Ok(file_name)
}

/// Removes a freshly created artifact on drop unless [`keep`](Self::keep) was called
///
/// Covers early returns and panics between `create_new` and the final fsync.
struct PartialArtifact {
    path: Option<PathBuf>,
}

impl PartialArtifact {
    fn new(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    fn keep(mut self) {
        self.path = None;
    }
}

impl Drop for PartialArtifact {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            if let Err(e) = std::fs::remove_file(&path) {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove partial artifact");
            }
        }
    }
}

/// Message recorded on a FAILED task
fn failure_message(error: Error) -> String {
    match error {
        // background errors carry their own fixed wording
        Error::Extraction(e) => e.to_string(),
        other => other.to_string(),
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

//! Public export service.
//!
//! [`ExportService`] composes the [`TaskStore`], the [`TaskRunner`], and a periodic
//! TTL sweeper:
//! - [`submit`](ExportService::submit) validates the date shape, creates a PENDING
//!   task and hands it to the runner without blocking
//! - [`status`](ExportService::status) is a pure read against the store
//! - [`fetch`](ExportService::fetch) opens the finished artifact for streaming
//! - [`start_sweeper`](ExportService::start_sweeper) evicts task records older than
//!   the configured TTL on a fixed interval

use crate::config::Config;
use crate::error::{Error, Result};
use crate::extractor;
use crate::runner::TaskRunner;
use crate::store::TaskStore;
use crate::types::{TaskId, TaskSnapshot, TaskStatus};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::task::JoinHandle;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;

/// How long `shutdown` waits for in-flight exports
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Asynchronous log export service (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct ExportService {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Task records, owned by this service instance
    pub(crate) store: Arc<TaskStore>,
    /// Background executor for export jobs
    pub(crate) runner: TaskRunner,
    /// Set to false once shutdown starts
    accepting_new: Arc<AtomicBool>,
    /// Cancels background loops (sweeper) on shutdown
    shutdown_token: CancellationToken,
}

/// A finished artifact opened for reading
///
/// Holds an open file handle, so the artifact can be streamed even if it is
/// deleted after `fetch` returned.
#[derive(Debug)]
pub struct ExportedArtifact {
    /// Artifact file name, suitable as a download filename
    pub file_name: String,
    /// Size in bytes
    pub len: u64,
    file: tokio::fs::File,
}

impl ExportedArtifact {
    /// Stream the artifact in chunks
    pub fn into_stream(self) -> ReaderStream<tokio::fs::File> {
        ReaderStream::new(self.file)
    }

    /// Read the whole artifact into memory
    pub async fn into_bytes(mut self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(usize::try_from(self.len).unwrap_or_default());
        self.file.read_to_end(&mut buf).await?;
        Ok(buf)
    }
}

impl ExportService {
    /// Create a new ExportService
    ///
    /// Validates the configuration and makes sure the output directory exists.
    /// The source log does not need to exist yet; exports against a missing
    /// source fail individually.
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;

        tokio::fs::create_dir_all(&config.export.output_dir)
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create output directory '{}': {}",
                        config.export.output_dir.display(),
                        e
                    ),
                ))
            })?;

        let store = Arc::new(TaskStore::new());
        let runner = TaskRunner::new(
            store.clone(),
            config.export.source_log.clone(),
            config.export.output_dir.clone(),
            config.export.max_concurrent_tasks,
        );

        tracing::info!(
            source_log = %config.export.source_log.display(),
            output_dir = %config.export.output_dir.display(),
            workers = config.export.max_concurrent_tasks,
            task_ttl_secs = config.export.task_ttl.as_secs(),
            "Export service initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            store,
            runner,
            accepting_new: Arc::new(AtomicBool::new(true)),
            shutdown_token: CancellationToken::new(),
        })
    }

    /// Submit an export of every source line starting with `date`
    ///
    /// Rejects dates not shaped `YYYY-MM-DD` with [`Error::InvalidArgument`]
    /// before any task is created. Otherwise returns the new task id at once;
    /// extraction happens in the background and its outcome is observed through
    /// [`status`](Self::status).
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(&self, date: &str) -> Result<TaskId> {
        if !self.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }
        extractor::validate_date_format(date)?;

        let id = self.store.create();
        tracing::info!(task_id = %id, date, "Export task submitted");

        self.runner.spawn(id.clone(), date.to_string());
        Ok(id)
    }

    /// Current status of task `id`
    ///
    /// Unknown or expired ids yield a `NOT_FOUND` snapshot.
    pub fn status(&self, id: &TaskId) -> TaskSnapshot {
        self.store.get(id).into()
    }

    /// Open the artifact of a completed task
    ///
    /// # Errors
    ///
    /// - [`Error::NotReady`] if the task is not COMPLETED (including unknown ids,
    ///   reported with status `NOT_FOUND`)
    /// - [`Error::ArtifactMissing`] if the recorded artifact is gone from disk
    pub async fn fetch(&self, id: &TaskId) -> Result<ExportedArtifact> {
        let task = self.store.get(id);
        let file_name = match (task.status, task.result_file) {
            (TaskStatus::Completed, Some(file_name)) => file_name,
            (status, _) => {
                return Err(Error::NotReady {
                    id: id.clone(),
                    status,
                });
            }
        };

        let path = self.artifact_path(&file_name);
        let missing = || Error::ArtifactMissing {
            id: id.clone(),
            path: path.clone(),
        };

        let file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(missing()),
            Err(e) => return Err(Error::Io(e)),
        };
        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Err(missing());
        }

        Ok(ExportedArtifact {
            file_name,
            len: metadata.len(),
            file,
        })
    }

    /// Remove task records older than the configured TTL
    ///
    /// Also deletes the artifacts of swept COMPLETED tasks when
    /// `remove_artifacts_on_sweep` is set. Returns the number of records removed.
    pub async fn sweep(&self) -> usize {
        let removed = self.store.sweep(self.config.export.task_ttl);
        if removed.is_empty() {
            return 0;
        }

        if self.config.export.remove_artifacts_on_sweep {
            for file_name in removed.iter().filter_map(|task| task.result_file.as_ref()) {
                let path = self.artifact_path(file_name);
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Failed to remove swept artifact");
                    }
                }
            }
        }

        tracing::info!(
            removed = removed.len(),
            remaining = self.store.len(),
            "Swept expired export tasks"
        );
        removed.len()
    }

    /// Start the background sweeper that runs [`sweep`](Self::sweep) every
    /// `sweep_interval`
    ///
    /// The loop exits when [`shutdown`](Self::shutdown) is called.
    pub fn start_sweeper(&self) -> JoinHandle<()> {
        let service = self.clone();
        let period = self.config.export.sweep_interval;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            tracing::info!(interval_secs = period.as_secs(), "Task sweeper started");

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        service.sweep().await;
                    }
                    _ = service.shutdown_token.cancelled() => {
                        tracing::info!("Task sweeper shutting down");
                        break;
                    }
                }
            }
        })
    }

    /// Gracefully shut down the service
    ///
    /// 1. Stops accepting submissions ([`Error::ShuttingDown`])
    /// 2. Stops the sweeper
    /// 3. Waits (bounded) for in-flight exports to record their outcome
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        self.accepting_new.store(false, Ordering::SeqCst);
        self.shutdown_token.cancel();

        match tokio::time::timeout(SHUTDOWN_TIMEOUT, self.runner.wait_idle()).await {
            Ok(()) => tracing::info!("All in-flight exports finished"),
            Err(_) => tracing::warn!(
                in_flight = self.runner.in_flight(),
                "Timeout waiting for exports to finish, proceeding with shutdown"
            ),
        }

        tracing::info!("Graceful shutdown complete");
        Ok(())
    }

    /// Number of tracked tasks
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether no tasks are tracked
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Spawn the REST API server in a background task
    pub fn spawn_api_server(self: &Arc<Self>) -> JoinHandle<Result<()>> {
        let service = self.clone();
        let config = self.config.clone();

        tokio::spawn(async move { crate::api::start_api_server(service, config).await })
    }

    fn artifact_path(&self, file_name: &str) -> PathBuf {
        self.config.export.output_dir.join(file_name)
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{
        SAMPLE_LOG, create_test_service, create_test_service_with, wait_for_terminal,
    };

    #[tokio::test]
    async fn submit_returns_before_completion() {
        let (service, _dir) = create_test_service(Some(SAMPLE_LOG)).await;

        let id = service.submit("2024-01-01").unwrap();
        let snapshot = service.status(&id);

        assert!(
            matches!(
                snapshot.status,
                TaskStatus::Pending | TaskStatus::Processing
            ),
            "freshly submitted task must not be terminal, got {}",
            snapshot.status
        );
        assert_eq!(snapshot.task_id, id);
    }

    #[tokio::test]
    async fn submit_rejects_malformed_date_without_creating_task() {
        let (service, _dir) = create_test_service(Some(SAMPLE_LOG)).await;

        let err = service.submit("01/01/2024").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(service.is_empty());
    }

    #[tokio::test]
    async fn completed_task_can_be_fetched_repeatedly() {
        let (service, _dir) = create_test_service(Some(SAMPLE_LOG)).await;
        let id = service.submit("2024-01-01").unwrap();

        let done = wait_for_terminal(&service, &id).await;
        assert_eq!(done.status, TaskStatus::Completed);
        assert_eq!(service.status(&id), done, "terminal snapshot must be stable");

        for _ in 0..2 {
            let artifact = service.fetch(&id).await.unwrap();
            assert_eq!(artifact.file_name, done.result_file.clone().unwrap());
            assert_eq!(artifact.len, 26);
            let bytes = artifact.into_bytes().await.unwrap();
            assert_eq!(bytes, b"2024-01-01 a\n2024-01-01 c\n");
        }
    }

    #[tokio::test]
    async fn fetch_before_completion_is_not_ready() {
        let (service, _dir) = create_test_service(Some(SAMPLE_LOG)).await;
        let id = service.store.create();

        match service.fetch(&id).await {
            Err(Error::NotReady { status, .. }) => assert_eq!(status, TaskStatus::Pending),
            other => panic!("expected NotReady, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_unknown_id_reports_not_found_status() {
        let (service, _dir) = create_test_service(Some(SAMPLE_LOG)).await;

        match service.fetch(&TaskId::from("no-such-task")).await {
            Err(Error::NotReady { status, .. }) => assert_eq!(status, TaskStatus::NotFound),
            other => panic!("expected NotReady(NOT_FOUND), got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_failed_task_is_not_ready() {
        let (service, _dir) = create_test_service(Some(SAMPLE_LOG)).await;
        let id = service.submit("2024-03-03").unwrap();
        wait_for_terminal(&service, &id).await;

        match service.fetch(&id).await {
            Err(Error::NotReady { status, .. }) => assert_eq!(status, TaskStatus::Failed),
            other => panic!("expected NotReady(FAILED), got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_deleted_artifact_is_artifact_missing() {
        let (service, _dir) = create_test_service(Some(SAMPLE_LOG)).await;
        let id = service.submit("2024-01-01").unwrap();
        let done = wait_for_terminal(&service, &id).await;

        std::fs::remove_file(
            service
                .config
                .export
                .output_dir
                .join(done.result_file.unwrap()),
        )
        .unwrap();

        assert!(matches!(
            service.fetch(&id).await,
            Err(Error::ArtifactMissing { .. })
        ));
    }

    #[tokio::test]
    async fn sweep_evicts_old_tasks_and_their_artifacts() {
        let (service, _dir) = create_test_service(Some(SAMPLE_LOG)).await;
        let old = service.submit("2024-01-01").unwrap();
        let old_done = wait_for_terminal(&service, &old).await;
        let fresh = service.submit("2024-01-02").unwrap();
        wait_for_terminal(&service, &fresh).await;

        service
            .store
            .backdate(&old, service.config.export.task_ttl + Duration::from_secs(1));

        assert_eq!(service.sweep().await, 1);
        assert_eq!(service.status(&old).status, TaskStatus::NotFound);
        assert_eq!(service.status(&fresh).status, TaskStatus::Completed);
        assert!(
            !service
                .config
                .export
                .output_dir
                .join(old_done.result_file.unwrap())
                .exists(),
            "swept artifact should be removed"
        );
    }

    #[tokio::test]
    async fn sweeper_loop_runs_on_interval_and_stops_on_shutdown() {
        let (service, _dir) = create_test_service_with(Some(SAMPLE_LOG), |config| {
            config.export.sweep_interval = Duration::from_millis(20);
        })
        .await;

        let id = service.store.create();
        service.store.backdate(&id, Duration::from_secs(48 * 3600));

        let handle = service.start_sweeper();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(service.status(&id).status, TaskStatus::NotFound);

        service.shutdown().await.unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper should stop after shutdown")
            .unwrap();
    }

    #[tokio::test]
    async fn shutdown_waits_for_in_flight_and_rejects_new_work() {
        let (service, _dir) = create_test_service(Some(SAMPLE_LOG)).await;
        let id = service.submit("2024-01-01").unwrap();

        service.shutdown().await.unwrap();

        assert!(service.status(&id).status.is_terminal());
        assert!(matches!(
            service.submit("2024-01-01"),
            Err(Error::ShuttingDown)
        ));
    }

    #[tokio::test]
    async fn new_rejects_invalid_config() {
        let mut config = Config::default();
        config.export.max_concurrent_tasks = 0;
        assert!(matches!(
            ExportService::new(config).await,
            Err(Error::Config { .. })
        ));
    }
}

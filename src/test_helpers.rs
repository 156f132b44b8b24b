//! Shared test helpers for creating ExportService instances in tests.

use crate::config::Config;
use crate::service::ExportService;
use crate::types::{TaskId, TaskSnapshot};
use std::time::Duration;
use tempfile::tempdir;

/// Source log with two dates, two lines for 2024-01-01
pub(crate) const SAMPLE_LOG: &str = "2024-01-01 a\n2024-01-02 b\n2024-01-01 c\n";

/// Helper to create a test ExportService rooted in a temp directory.
/// Writes `source` as the source log when given, otherwise leaves it absent.
/// Returns the service and the tempdir (which must be kept alive).
pub(crate) async fn create_test_service(
    source: Option<&str>,
) -> (ExportService, tempfile::TempDir) {
    create_test_service_with(source, |_| {}).await
}

/// Like [`create_test_service`], letting `configure` adjust the config first
pub(crate) async fn create_test_service_with(
    source: Option<&str>,
    configure: impl FnOnce(&mut Config),
) -> (ExportService, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();

    let mut config = Config::default();
    config.export.source_log = temp_dir.path().join("app.log");
    config.export.output_dir = temp_dir.path().join("exports");
    config.export.max_concurrent_tasks = 2;
    configure(&mut config);

    if let Some(body) = source {
        std::fs::write(&config.export.source_log, body).unwrap();
    }

    let service = ExportService::new(config).await.unwrap();
    (service, temp_dir)
}

/// Poll `status` until the task reaches a terminal state (5s cap)
pub(crate) async fn wait_for_terminal(service: &ExportService, id: &TaskId) -> TaskSnapshot {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let snapshot = service.status(id);
            if snapshot.status.is_terminal() {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("task did not reach a terminal state in time")
}

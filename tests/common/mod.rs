//! Common test utilities for log-export integration tests

use log_export::{Config, ExportService, TaskId, TaskSnapshot};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

/// Source log used by most scenarios
pub const SAMPLE_LINES: &[&str] = &["2024-01-01 a", "2024-01-02 b", "2024-01-01 c"];

/// Write `lines` (newline-terminated) as the source log at `path`
pub fn write_source(path: &Path, lines: &[&str]) {
    let mut body = lines.join("\n");
    body.push('\n');
    std::fs::write(path, body).expect("write source log");
}

/// Build a config rooted in `dir`
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.export.source_log = dir.join("app.log");
    config.export.output_dir = dir.join("exports");
    config.export.max_concurrent_tasks = 4;
    config
}

/// Create a service over a fresh temp dir, with `lines` as the source log
///
/// Returns the tempdir, which must be kept alive.
pub async fn service_with_source(lines: &[&str]) -> (ExportService, TempDir) {
    service_with(lines, |_| {}).await
}

/// Like [`service_with_source`], letting `configure` adjust the config first
pub async fn service_with(
    lines: &[&str],
    configure: impl FnOnce(&mut Config),
) -> (ExportService, TempDir) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let mut config = test_config(dir.path());
    configure(&mut config);
    write_source(&config.export.source_log, lines);

    let service = ExportService::new(config).await.expect("create service");
    (service, dir)
}

/// Create a service whose configured source log does not exist
///
/// Returns the tempdir, which must be kept alive.
pub async fn service_without_source() -> (ExportService, TempDir) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let config = test_config(dir.path());

    let service = ExportService::new(config).await.expect("create service");
    (service, dir)
}

/// Poll until task `id` is COMPLETED or FAILED
pub async fn wait_for_terminal(service: &ExportService, id: &TaskId) -> TaskSnapshot {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let snapshot = service.status(id);
            if snapshot.status.is_terminal() {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("task {id} did not finish in time"))
}

//! # log-export
//!
//! Asynchronous per-day log export service.
//!
//! A client submits a calendar date; the service immediately returns a task id and,
//! on a bounded background worker pool, slices every line of the source log that
//! starts with that date into a standalone artifact file. The client polls the
//! task's status and downloads the artifact once it is COMPLETED.
//!
//! ## Quick Start
//!
//! ```no_run
//! use log_export::{Config, ExportService, TaskStatus};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = ExportService::new(Config::default()).await?;
//!     let _sweeper = service.start_sweeper();
//!
//!     let id = service.submit("2024-01-01")?;
//!     loop {
//!         let snapshot = service.status(&id);
//!         if snapshot.status.is_terminal() {
//!             break;
//!         }
//!         tokio::time::sleep(std::time::Duration::from_millis(50)).await;
//!     }
//!
//!     if service.status(&id).status == TaskStatus::Completed {
//!         let bytes = service.fetch(&id).await?.into_bytes().await?;
//!         println!("{} bytes exported", bytes.len());
//!     }
//!
//!     service.shutdown().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Date-prefix extraction from the source log
pub mod extractor;
/// Bounded background execution of export tasks
pub mod runner;
/// Public export service
pub mod service;
/// In-memory task store
pub mod store;
/// Core task types
pub mod types;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use config::{ApiConfig, Config, ExportConfig};
pub use error::{ApiError, Error, ErrorDetail, ExtractionError, Result, ToHttpStatus};
pub use runner::TaskRunner;
pub use service::{ExportService, ExportedArtifact};
pub use store::TaskStore;
pub use types::{Task, TaskId, TaskSnapshot, TaskStatus, TaskUpdate};

/// Helper function to run the service with graceful signal handling.
///
/// Waits for a termination signal and then calls the service's `shutdown()` method.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use log_export::{Config, ExportService, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let service = ExportService::new(Config::default()).await?;
///     service.start_sweeper();
///
///     // Run with automatic signal handling
///     run_with_shutdown(service).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(service: ExportService) -> Result<()> {
    wait_for_signal().await;
    service.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Signal registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}

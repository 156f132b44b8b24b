//! Error types for log-export
//!
//! This module provides error handling for the library, including:
//! - The crate-wide [`Error`] returned by synchronous operations
//! - [`ExtractionError`] for background failures that are recorded on tasks
//! - HTTP status code mapping and the JSON error envelope for the REST API

use crate::types::{TaskId, TaskStatus};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for log-export operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for log-export
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "max_concurrent_tasks")
        key: Option<String>,
    },

    /// Caller supplied a malformed argument (e.g. a date not in YYYY-MM-DD form)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Artifact requested before the task completed
    ///
    /// `status` is [`TaskStatus::NotFound`] for unknown or expired ids.
    #[error("task {id} is not ready: status {status}")]
    NotReady {
        /// The task that was fetched
        id: TaskId,
        /// Its status at fetch time
        status: TaskStatus,
    },

    /// Task completed but its artifact is no longer on disk
    #[error("artifact for task {id} is missing at {path}")]
    ArtifactMissing {
        /// The completed task
        id: TaskId,
        /// Where the artifact was expected
        path: PathBuf,
    },

    /// Background extraction failure
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Shutdown in progress - not accepting new export tasks
    #[error("shutdown in progress: not accepting new export tasks")]
    ShuttingDown,
}

/// Failures of the background export phase
///
/// These never reach a submitting caller; the runner records their display
/// string as the `message` of the FAILED task.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Source log file does not exist
    #[error("source log not found: {}", path.display())]
    SourceNotFound {
        /// Configured source log path
        path: PathBuf,
    },

    /// Source exists but no line starts with the requested date
    #[error("no entries for date {date}")]
    EmptyResult {
        /// Requested date
        date: String,
    },

    /// Date has the right shape but is not a real calendar date
    #[error("invalid date {date}: expected a calendar date in YYYY-MM-DD form")]
    InvalidDate {
        /// Requested date
        date: String,
    },
}

/// API error response format
///
/// Returned by API endpoints when an error occurs.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "not_ready",
///     "message": "task 6f1c... is not ready: status PROCESSING",
///     "details": {
///       "task_id": "6f1c...",
///       "status": "PROCESSING"
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "invalid_argument", "not_ready")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::InvalidArgument(_) => 400,

            // Unknown ids surface as a status value; over HTTP that is a 404
            Error::NotReady {
                status: TaskStatus::NotFound,
                ..
            } => 404,
            // 409 Conflict - task exists but is not in a fetchable state
            Error::NotReady { .. } => 409,

            // 410 Gone - artifact existed once but was removed
            Error::ArtifactMissing { .. } => 410,

            // 422 Unprocessable Entity - background failures if ever surfaced
            Error::Extraction(_) => 422,

            // 500 Internal Server Error - Server-side issues
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,

            // 503 Service Unavailable
            Error::ShuttingDown => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::InvalidArgument(_) => "invalid_argument",
            Error::NotReady {
                status: TaskStatus::NotFound,
                ..
            } => "task_not_found",
            Error::NotReady { .. } => "not_ready",
            Error::ArtifactMissing { .. } => "artifact_missing",
            Error::Extraction(e) => match e {
                ExtractionError::SourceNotFound { .. } => "source_not_found",
                ExtractionError::EmptyResult { .. } => "empty_result",
                ExtractionError::InvalidDate { .. } => "invalid_date",
            },
            Error::Io(_) => "io_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::ShuttingDown => "shutting_down",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        // Add contextual details for specific error types
        let details = match &error {
            Error::NotReady { id, status } => Some(serde_json::json!({
                "task_id": id,
                "status": status,
            })),
            Error::ArtifactMissing { id, path } => Some(serde_json::json!({
                "task_id": id,
                "path": path,
            })),
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}

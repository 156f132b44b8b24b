//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`logs`]: export submission, status polling, artifact download
//! - [`system`]: health, OpenAPI

use crate::types::TaskId;
use serde::{Deserialize, Serialize};

mod logs;
mod system;

// Re-export all handlers so `routes::function_name` works
pub use logs::*;
pub use system::*;

// ============================================================================
// Query/Response Types (shared across handlers)
// ============================================================================

/// Query parameters for POST /api/logs/async
#[derive(Debug, Deserialize, Serialize, utoipa::IntoParams, utoipa::ToSchema)]
#[into_params(parameter_in = Query)]
pub struct SubmitQuery {
    /// Date to export, in YYYY-MM-DD form
    pub date: Option<String>,
}

/// Response body for POST /api/logs/async
#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    /// Id of the created task
    pub task_id: TaskId,
    /// Where to poll the task's status
    pub status_url: String,
    /// Where to download the artifact once COMPLETED
    pub file_url: String,
}

impl SubmitResponse {
    /// Build the response for a freshly submitted task
    pub fn for_task(task_id: TaskId) -> Self {
        Self {
            status_url: format!("/api/logs/status/{task_id}"),
            file_url: format!("/api/logs/file/{task_id}"),
            task_id,
        }
    }
}

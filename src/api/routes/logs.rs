//! Export handlers: submit, status, download.

use super::{SubmitQuery, SubmitResponse};
use crate::api::AppState;
use crate::error::Error;
use crate::types::TaskId;
use axum::{
    Json,
    body::Body,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

/// POST /api/logs/async - Submit a log export for one date
#[utoipa::path(
    post,
    path = "/api/logs/async",
    tag = "logs",
    params(SubmitQuery),
    responses(
        (status = 202, description = "Export accepted", body = SubmitResponse),
        (status = 400, description = "Missing or malformed date", body = crate::error::ApiError),
        (status = 503, description = "Service is shutting down", body = crate::error::ApiError)
    )
)]
pub async fn submit_export(
    State(state): State<AppState>,
    Query(query): Query<SubmitQuery>,
) -> Result<Response, Error> {
    let date = query.date.ok_or_else(|| {
        Error::InvalidArgument("missing required query parameter 'date'".to_string())
    })?;

    let task_id = state.service.submit(date.trim())?;

    Ok((StatusCode::ACCEPTED, Json(SubmitResponse::for_task(task_id))).into_response())
}

/// GET /api/logs/status/:id - Current status of an export task
#[utoipa::path(
    get,
    path = "/api/logs/status/{id}",
    tag = "logs",
    params(
        ("id" = String, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task snapshot; status is NOT_FOUND for unknown ids", body = crate::types::TaskSnapshot)
    )
)]
pub async fn get_status(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    Json(state.service.status(&TaskId::from(id)))
}

/// GET /api/logs/file/:id - Download the artifact of a completed task
#[utoipa::path(
    get,
    path = "/api/logs/file/{id}",
    tag = "logs",
    params(
        ("id" = String, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Artifact contents", content_type = "text/plain"),
        (status = 404, description = "Unknown or expired task", body = crate::error::ApiError),
        (status = 409, description = "Task is not COMPLETED", body = crate::error::ApiError),
        (status = 410, description = "Artifact was removed from disk", body = crate::error::ApiError)
    )
)]
pub async fn download_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, Error> {
    let artifact = state.service.fetch(&TaskId::from(id)).await?;

    let headers = [
        (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
        (header::CONTENT_LENGTH, artifact.len.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", artifact.file_name),
        ),
    ];

    Ok((headers, Body::from_stream(artifact.into_stream())).into_response())
}

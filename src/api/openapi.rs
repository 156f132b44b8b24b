//! OpenAPI documentation and schema generation
//!
//! Defines the OpenAPI specification for the log-export REST API using utoipa
//! for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the log-export REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "log-export REST API",
        version = "0.1.0",
        description = "Asynchronous per-day log export: submit a date, poll the task, download the artifact",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        // Exports
        crate::api::routes::submit_export,
        crate::api::routes::get_status,
        crate::api::routes::download_file,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        crate::types::TaskId,
        crate::types::TaskStatus,
        crate::types::TaskSnapshot,

        crate::config::Config,
        crate::config::ExportConfig,
        crate::config::ServerIntegrationConfig,
        crate::config::ApiConfig,

        crate::api::routes::SubmitQuery,
        crate::api::routes::SubmitResponse,

        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "logs", description = "Log export submission, status and download"),
        (name = "system", description = "Health check and API documentation")
    )
)]
pub struct ApiDoc;

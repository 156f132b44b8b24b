//! REST API server demo
//!
//! Runs log-export with the REST API, the TTL sweeper and signal-driven shutdown.
//!
//! Usage: `cargo run --example export_server -- [SOURCE_LOG] [OUTPUT_DIR]`
//!
//! After starting, you can:
//! - View Swagger UI at http://localhost:8080/swagger-ui
//! - Submit an export via POST http://localhost:8080/api/logs/async?date=2024-01-01
//! - Poll it via GET http://localhost:8080/api/logs/status/{taskId}
//! - Download it via GET http://localhost:8080/api/logs/file/{taskId}
//!
//! Set `RUST_LOG=log_export=debug,tower_http=debug` for verbose logging.

use log_export::{Config, ExportService, run_with_shutdown};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("log_export=info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let mut config = Config::default();
    if let Some(source_log) = args.next() {
        config.export.source_log = source_log.into();
    }
    if let Some(output_dir) = args.next() {
        config.export.output_dir = output_dir.into();
    }
    config.server.api.cors_origins = vec!["*".to_string()];

    let service = Arc::new(ExportService::new(config).await?);
    let sweeper = service.start_sweeper();
    let api = service.spawn_api_server();

    let bind = service.get_config().server.api.bind_address;
    println!("Starting log-export REST API server");
    println!("Swagger UI: http://{bind}/swagger-ui");
    println!();
    println!("Example commands:");
    println!("  curl -X POST 'http://{bind}/api/logs/async?date=2024-01-01'");
    println!("  curl http://{bind}/api/logs/status/<taskId>");
    println!("  curl -OJ http://{bind}/api/logs/file/<taskId>");

    run_with_shutdown((*service).clone()).await?;

    api.abort();
    sweeper.await?;
    Ok(())
}

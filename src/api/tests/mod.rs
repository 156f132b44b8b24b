use super::*;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use std::time::Duration;
use tower::ServiceExt; // for oneshot()


/// Helper to create a test ExportService instance wrapped in Arc
async fn create_test_service(source: Option<&str>) -> (Arc<ExportService>, tempfile::TempDir) {
    let (service, temp_dir) = crate::test_helpers::create_test_service(source).await;
    (Arc::new(service), temp_dir)
}

/// Router over `service` using its own configuration
fn router_for(service: &Arc<ExportService>) -> Router {
    create_router(service.clone(), service.get_config())
}

async fn send(app: Router, method: &str, uri: &str) -> Response {
    app.oneshot(
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

async fn body_json(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).expect("Response should be valid JSON")
}

#[tokio::test]
async fn test_api_server_spawns() {
    let (service, _temp_dir) = create_test_service(None).await;

    // Port 0 = OS assigns a free port
    let mut config = (*service.get_config()).clone();
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap();
    let config = Arc::new(config);

    let api_handle = tokio::spawn({
        let service = service.clone();
        let config = config.clone();
        async move { start_api_server(service, config).await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!api_handle.is_finished(), "server should still be running");
    api_handle.abort();
}

#[tokio::test]
async fn test_server_serves_requests_over_tcp() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let (service, _temp_dir) = create_test_service(None).await;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router_for(&service);
    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.unwrap();

    assert!(raw.starts_with("HTTP/1.1 200"), "unexpected response: {raw}");
    assert!(raw.contains("\"status\":\"ok\""));

    server_handle.abort();
}

#[tokio::test]
async fn test_cors_enabled() {
    let (service, _temp_dir) = create_test_service(None).await;

    let mut config = (*service.get_config()).clone();
    config.server.api.cors_enabled = true;
    config.server.api.cors_origins = vec!["*".to_string()];
    let app = create_router(service, Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let (service, _temp_dir) = create_test_service(None).await;

    let mut config = (*service.get_config()).clone();
    config.server.api.cors_enabled = false;
    let app = create_router(service, Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[test]
fn test_cors_layer_specific_origins() {
    // Invalid header values are skipped rather than failing the whole layer
    let _layer = build_cors_layer(&[
        "http://localhost:3000".to_string(),
        "not a valid\nheader".to_string(),
    ]);
}

#[tokio::test]
async fn test_spawn_api_server_method() {
    let (service, _temp_dir) =
        crate::test_helpers::create_test_service_with(None, |config| {
            config.server.api.bind_address = "127.0.0.1:0".parse().unwrap();
        })
        .await;
    let service = Arc::new(service);

    let api_handle = service.spawn_api_server();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!api_handle.is_finished());
    api_handle.abort();
}

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use base64::{Engine as _, engine::general_purpose};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::time::Duration;
use swift_thumbnailer::{
    build_router,
    services::{
        container_provisioner::ContainerProvisioner, image_transformer::ImageTransformer,
        object_store_client::SwiftClient, pipeline::ThumbnailPipeline,
    },
    state::AppState,
};
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::MockServer;

fn app(temp: &TempDir, webhook_auth: Option<&str>) -> Router {
    let client = SwiftClient::new(temp.path(), Duration::from_secs(5)).expect("http client");
    let pipeline = ThumbnailPipeline::new(
        client.clone(),
        ContainerProvisioner::new(client),
        ImageTransformer::default(),
    );
    let state = AppState::new(pipeline, temp.path())
        .with_webhook_auth(webhook_auth.map(str::to_string));
    build_router(state)
}

fn notification(method: &str, url: &str) -> Value {
    json!({
        "swiftObj": {
            "method": method,
            "container": "images",
            "object": "600_0985.jpg",
            "token": "T",
            "url": url
        }
    })
}

fn post_json(body: &Value, authorization: Option<String>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/thumbnail")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request builder should not fail")
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("response body must be readable")
        .to_bytes();
    serde_json::from_slice(bytes.as_ref()).expect("response must be valid JSON")
}

#[tokio::test]
async fn healthz_returns_ok_json() {
    let temp = TempDir::new().unwrap();
    let response = app(&temp, None)
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "status": "ok" }));
}

#[tokio::test]
async fn readyz_probes_temp_dir() {
    let temp = TempDir::new().unwrap();
    let response = app(&temp, None)
        .oneshot(Request::builder().uri("/readyz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["checks"]["temp_dir"]["ok"], true);
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn readyz_reports_unusable_temp_dir() {
    let temp = TempDir::new().unwrap();
    let client = SwiftClient::new(temp.path(), Duration::from_secs(5)).unwrap();
    let pipeline = ThumbnailPipeline::new(
        client.clone(),
        ContainerProvisioner::new(client),
        ImageTransformer::default(),
    );
    let state = AppState::new(pipeline, temp.path().join("missing"));

    let response = build_router(state)
        .oneshot(Request::builder().uri("/readyz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(response).await["checks"]["temp_dir"]["ok"], false);
}

#[tokio::test]
async fn delete_notification_takes_no_action() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();

    let response = app(&temp, None)
        .oneshot(post_json(&notification("DELETE", &server.uri()), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({ "result": { "success": "No action taken, image was deleted" } })
    );
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_method_is_rejected_with_kind() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();

    let response = app(&temp, None)
        .oneshot(post_json(&notification("COPY", &server.uri()), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["kind"], "InvalidOperationError");
    assert_eq!(body["status"], 400);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn webhook_credentials_are_enforced() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    let payload = notification("DELETE", &server.uri());

    let missing = app(&temp, Some("swift:secret"))
        .oneshot(post_json(&payload, None))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let good = format!("Basic {}", general_purpose::STANDARD.encode("swift:secret"));
    let accepted = app(&temp, Some("swift:secret"))
        .oneshot(post_json(&payload, Some(good)))
        .await
        .unwrap();
    assert_eq!(accepted.status(), StatusCode::OK);
}

#[tokio::test]
async fn unreachable_store_maps_to_bad_gateway() {
    let temp = TempDir::new().unwrap();

    let response = app(&temp, None)
        .oneshot(post_json(&notification("PUT", "http://127.0.0.1:9"), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(json_body(response).await["kind"], "TransferError");
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
}

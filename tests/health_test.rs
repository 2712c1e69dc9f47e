mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use tooltrack_api::middleware_helpers::request_id::REQUEST_ID_HEADER;

#[tokio::test]
async fn health_reports_version_and_uptime() {
    let app = TestApp::new().await;
    let response = app.request(Method::GET, "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));

    let body = response_json(response).await;
    assert_eq!(body["status"], "up");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["uptime_seconds"].is_u64());
}

#[tokio::test]
async fn database_health_names_the_backend() {
    let app = TestApp::new().await;
    let response = app.request(Method::GET, "/health/db", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["status"], "connected");
    assert_eq!(body["database"], "sqlite");
}

#[tokio::test]
async fn api_responses_carry_request_metadata() {
    let app = TestApp::new().await;
    let response = app.request(Method::GET, "/api/v1/status", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let header = response.headers()[REQUEST_ID_HEADER]
        .to_str()
        .unwrap()
        .to_string();

    let body = response_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["meta"]["request_id"], header);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::new().await;
    let response = app
        .request(Method::GET, "/api-docs/openapi.json", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert!(body["paths"]["/api/v1/tool-tracker/checkouts"].is_object());
}

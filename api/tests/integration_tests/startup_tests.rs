//! Integration tests for startup against a mock InfluxDB.
//!
//! Tests cover:
//! - Organization resolution before serving
//! - Fail-fast when the organization cannot be resolved
//! - End-to-end writes through the InfluxDB point store

use api::{build_state, create_router};
use axum::http::StatusCode;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::common::{post_json, test_config};

async fn mount_org_lookup(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v2/orgs"))
        .and(query_param("org", "acme"))
        .and(header("authorization", "Token test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "orgs": [{"id": "9f8e7d", "name": "acme"}]
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_build_state_resolves_organization() {
    let server = MockServer::start().await;
    mount_org_lookup(&server).await;

    let state = build_state(&test_config(&server.uri())).await.unwrap();

    assert_eq!(state.organization().id, "9f8e7d");
    assert_eq!(state.organization().name, "acme");
}

#[tokio::test]
async fn test_build_state_fails_without_organization() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/orgs"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": "not found",
            "message": "organization name \"acme\" not found"
        })))
        .mount(&server)
        .await;

    let err = build_state(&test_config(&server.uri()))
        .await
        .err()
        .expect("startup must fail");

    let message = format!("{err:#}");
    assert!(message.contains("acme"), "{message}");
}

#[tokio::test]
async fn test_build_state_fails_when_influx_unreachable() {
    // Nothing listens on port 9 on the loopback interface.
    let result = build_state(&test_config("http://127.0.0.1:9")).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_report_is_written_to_influx() {
    let server = MockServer::start().await;
    mount_org_lookup(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v2/write"))
        .and(query_param("orgID", "9f8e7d"))
        .and(query_param("bucket", "errors"))
        .and(query_param("precision", "ns"))
        .and(body_string_contains(
            "error_logs,endpoint=/v1/x,service=api error=\"timeout\" ",
        ))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let state = build_state(&test_config(&server.uri())).await.unwrap();
    let app = create_router(state);

    let (status, response) = post_json(
        app,
        json!({"service": "api", "endpoint": "/v1/x", "error": "timeout"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, json!("Error logged"));
}

#[tokio::test]
async fn test_influx_rejection_maps_to_500() {
    let server = MockServer::start().await;
    mount_org_lookup(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v2/write"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "unauthorized",
            "message": "token expired"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let state = build_state(&test_config(&server.uri())).await.unwrap();
    let app = create_router(state);

    let (status, response) = post_json(
        app,
        json!({"service": "api", "endpoint": "/v1/x", "error": "timeout"}),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response, json!("Error writing point to store"));
}

#[tokio::test]
async fn test_invalid_report_is_not_written_to_influx() {
    let server = MockServer::start().await;
    mount_org_lookup(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/v2/write"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let state = build_state(&test_config(&server.uri())).await.unwrap();
    let app = create_router(state);

    let (status, _) = post_json(
        app,
        json!({"service": "", "endpoint": "/v1/x", "error": "timeout"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

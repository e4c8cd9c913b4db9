//! Integration tests for error report ingestion.
//!
//! Tests cover:
//! - Successful ingestion with and without traceback
//! - Content-Type, JSON and required-field rejections
//! - Store failures
//! - Non-idempotent writes

use axum::http::StatusCode;
use serde_json::json;

use super::common::{failing_app, post_json, post_raw, test_app};

#[tokio::test]
async fn test_valid_report_is_stored() {
    let (app, store) = test_app();

    let (status, response) = post_json(
        app,
        json!({"service": "api", "endpoint": "/v1/x", "error": "timeout"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, json!("Error logged"));

    let points = store.points().unwrap();
    assert_eq!(points.len(), 1);

    let point = &points[0];
    assert_eq!(point.measurement, "error_logs");
    assert_eq!(point.tags.get("service").map(String::as_str), Some("api"));
    assert_eq!(point.tags.get("endpoint").map(String::as_str), Some("/v1/x"));
    assert_eq!(point.fields.len(), 1);
    assert_eq!(
        serde_json::to_value(&point.fields["error"]).unwrap(),
        json!("timeout")
    );
}

#[tokio::test]
async fn test_traceback_is_stored_verbatim() {
    let (app, store) = test_app();
    let traceback = "Traceback (most recent call last):\n  File \"x\", line 1";

    let (status, _) = post_json(
        app,
        json!({
            "service": "worker",
            "endpoint": "jobs.resize",
            "error": "out of memory",
            "traceback": traceback
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let points = store.points().unwrap();
    assert_eq!(
        serde_json::to_value(&points[0].fields["traceback"]).unwrap(),
        json!(traceback)
    );
}

#[tokio::test]
async fn test_absent_or_empty_traceback_is_not_stored() {
    let (app, store) = test_app();

    let bodies = [
        json!({"service": "a", "endpoint": "b", "error": "c"}),
        json!({"service": "a", "endpoint": "b", "error": "c", "traceback": ""}),
    ];

    for body in bodies {
        let (status, _) = post_json(app.clone(), body).await;
        assert_eq!(status, StatusCode::OK);
    }

    let points = store.points().unwrap();
    assert_eq!(points.len(), 2);
    assert!(points.iter().all(|p| !p.fields.contains_key("traceback")));
}

#[tokio::test]
async fn test_wrong_content_type_is_rejected_regardless_of_body() {
    let (app, store) = test_app();

    let valid = r#"{"service":"api","endpoint":"/v1/x","error":"timeout"}"#;
    let cases = [
        (Some("text/plain"), valid),
        (Some("application/xml"), valid),
        (None, valid),
        (Some("text/plain"), "not-json"),
    ];

    for (content_type, body) in cases {
        let (status, response) = post_raw(app.clone(), content_type, body).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE, "{content_type:?}");
        assert_eq!(response, json!("Content-Type must be application/json"));
    }

    assert_eq!(store.count().unwrap(), 0);
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let (app, store) = test_app();

    for body in ["not-json", "", "{", "[1, 2]", "\"just a string\""] {
        let (status, response) = post_raw(app.clone(), Some("application/json"), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body:?}");
        assert_eq!(response, json!("Error unmarshalling JSON"));
    }

    assert_eq!(store.count().unwrap(), 0);
}

#[tokio::test]
async fn test_wrongly_typed_field_is_rejected() {
    let (app, store) = test_app();

    let (status, _) = post_json(
        app,
        json!({"service": "api", "endpoint": "/v1/x", "error": {"code": 1}}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(store.count().unwrap(), 0);
}

#[tokio::test]
async fn test_missing_or_empty_required_fields_are_rejected() {
    let (app, store) = test_app();

    let bodies = [
        json!({"service": "", "endpoint": "/v1/x", "error": "timeout"}),
        json!({"service": "api", "endpoint": "", "error": "timeout"}),
        json!({"service": "api", "endpoint": "/v1/x", "error": ""}),
        json!({"endpoint": "/v1/x", "error": "timeout"}),
        json!({"service": "api", "error": "timeout"}),
        json!({"service": "api", "endpoint": "/v1/x", "traceback": "t"}),
        json!({}),
    ];

    for body in bodies {
        let (status, response) = post_json(app.clone(), body.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(response, json!("Missing required fields in the JSON payload"));
    }

    assert_eq!(store.count().unwrap(), 0);
}

#[tokio::test]
async fn test_store_failure_returns_generic_500() {
    let (app, store) = failing_app();

    let (status, response) = post_json(
        app,
        json!({"service": "api", "endpoint": "/v1/x", "error": "timeout"}),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response, json!("Error writing point to store"));
    assert_eq!(store.attempts(), 1);
}

#[tokio::test]
async fn test_invalid_reports_never_reach_the_store() {
    let (app, store) = failing_app();

    let (status, _) = post_json(app.clone(), json!({"service": "api"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_raw(app, Some("text/plain"), "x").await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

    assert_eq!(store.attempts(), 0);
}

#[tokio::test]
async fn test_identical_reports_produce_distinct_points() {
    let (app, store) = test_app();
    let body = json!({"service": "api", "endpoint": "/v1/x", "error": "timeout"});

    let (first, _) = post_json(app.clone(), body.clone()).await;
    tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    let (second, _) = post_json(app, body).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);

    let points = store.points().unwrap();
    assert_eq!(points.len(), 2);
    assert!(points[0].timestamp < points[1].timestamp);
}

#[tokio::test]
async fn test_concurrent_reports_are_all_stored() {
    let (app, store) = test_app();

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move {
                post_json(
                    app,
                    json!({"service": format!("svc-{i}"), "endpoint": "/", "error": "e"}),
                )
                .await
                .0
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }

    assert_eq!(store.count().unwrap(), 16);
}

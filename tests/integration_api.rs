//! HTTP API integration tests

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::util::ServiceExt;
use uuid::Uuid;

use payments_es::api;

mod common;

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_payment_lifecycle_over_http() {
    let pool = common::setup_test_db().await;
    let app = api::create_router().with_state(pool.clone());

    let payment_id = Uuid::new_v4();

    // 1. Initiate
    let response = app
        .clone()
        .oneshot(post_json(
            "/payments/initiate",
            json!({
                "payment_id": payment_id,
                "amount": "250.00",
                "currency": "USD",
                "user_id": "U1",
                "correlation_id": "corr-http-1",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED, "Initiate failed");
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["payment_id"], payment_id.to_string());
    assert!(json["event_id"].is_string());
    assert!(json["message_id"].is_string());

    // 2. Read model reflects the commit immediately
    let response = app
        .clone()
        .oneshot(get(&format!("/payments/{payment_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "Initiated");
    assert_eq!(json["currency"], "USD");
    assert_eq!(json["user_id"], "U1");

    // 3. Confirm
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/payments/{payment_id}/confirm"),
            json!({ "correlation_id": "corr-http-2" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK, "Confirm failed");

    // 4. Read model shows the confirmed status
    let response = app
        .clone()
        .oneshot(get(&format!("/payments/{payment_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "Confirmed");
}

#[tokio::test]
async fn test_invalid_amount_is_bad_request() {
    let pool = common::setup_test_db().await;
    let app = api::create_router().with_state(pool.clone());

    let response = app
        .oneshot(post_json(
            "/payments/initiate",
            json!({
                "payment_id": Uuid::new_v4(),
                "amount": "-5",
                "currency": "USD",
                "user_id": "U1",
                "correlation_id": "corr-http-3",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error_code"], "invalid_request");
}

#[tokio::test]
async fn test_duplicate_initiate_is_conflict() {
    let pool = common::setup_test_db().await;
    let app = api::create_router().with_state(pool.clone());

    let payment_id = Uuid::new_v4();
    let request = json!({
        "payment_id": payment_id,
        "amount": "10",
        "currency": "USD",
        "user_id": "U1",
        "correlation_id": "corr-http-4",
    });

    let response = app
        .clone()
        .oneshot(post_json("/payments/initiate", request.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let response = app
        .oneshot(post_json("/payments/initiate", request))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error_code"], "invalid_state");
}

#[tokio::test]
async fn test_unknown_payment_is_not_found() {
    let pool = common::setup_test_db().await;
    let app = api::create_router().with_state(pool.clone());

    let response = app
        .oneshot(get(&format!("/payments/{}", Uuid::new_v4())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error_code"], "payment_not_found");
}

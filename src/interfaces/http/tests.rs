//! Router-level tests: real handlers, middleware and an in-memory database

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::Service;

use super::create_api_router;
use crate::domain::payment::PaymentPolicy;
use crate::test_support::TestServices;

async fn app() -> Router {
    let state = TestServices::new(PaymentPolicy::Minimum)
        .await
        .into_api_state();
    create_api_router(state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().into_service().call(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn entry_body(plate: &str, space_id: i32) -> Value {
    json!({
        "plate": plate,
        "document_type": "DNI",
        "document_number": "12345678",
        "zone_id": 1,
        "space_id": space_id,
        "operator_id": 7,
        "email": "ana@mail.com"
    })
}

fn exit_body(document_number: &str) -> Value {
    json!({
        "document_type": "DNI",
        "document_number": document_number,
        "operator_id": 7
    })
}

#[tokio::test]
async fn entry_exit_and_payment_over_http() {
    let app = app().await;

    let (status, body) = send(&app, "POST", "/api/v1/transactions/entry", Some(entry_body("abc-123", 10))).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["plate_number"], "ABC-123");
    assert_eq!(body["data"]["status"], "ACTIVE");

    let (status, body) = send(&app, "GET", "/api/v1/transactions/active", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, "GET", "/api/v1/transactions/active/plate/abc-123", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"].as_i64(), Some(id));

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/transactions/{}/exit", id),
        Some(exit_body("12345678")),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["status"], "COMPLETED");
    assert_eq!(body["data"]["payment_status"], "UNPAID");
    assert_eq!(body["data"]["duration_minutes"], 1);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/transactions/{}/payment", id),
        Some(json!({ "payment_type_id": 1, "amount": "10.00", "operator_id": 7 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["transaction"]["payment_status"], "PAID");
    assert_eq!(body["data"]["payment"]["status"], "COMPLETED");
    let payment_id = body["data"]["payment"]["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/payments/{}/refund", payment_id),
        Some(json!({ "operator_id": 7, "reason": "duplicate charge" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["status"], "REFUNDED");
    assert_eq!(body["data"]["refund"]["reason"], "duplicate charge");
}

#[tokio::test]
async fn occupied_space_is_a_conflict() {
    let app = app().await;
    let (status, _) = send(&app, "POST", "/api/v1/transactions/entry", Some(entry_body("ABC-123", 10))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, "POST", "/api/v1/transactions/entry", Some(entry_body("XYZ-987", 10))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn wrong_exit_document_is_forbidden() {
    let app = app().await;
    let (_, body) = send(&app, "POST", "/api/v1/transactions/entry", Some(entry_body("ABC-123", 11))).await;
    let id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/transactions/exit",
        Some(json!({
            "plate": "ABC-123",
            "document_type": "DNI",
            "document_number": "87654321",
            "operator_id": 7
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{}", body);

    let (_, body) = send(&app, "GET", &format!("/api/v1/transactions/{}", id), None).await;
    assert_eq!(body["data"]["status"], "ACTIVE");
}

#[tokio::test]
async fn short_exit_document_is_forbidden_not_invalid() {
    let app = app().await;
    let (_, body) = send(&app, "POST", "/api/v1/transactions/entry", Some(entry_body("ABC-123", 11))).await;
    let id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/transactions/{}/exit", id),
        Some(exit_body("1234")),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{}", body);
}

#[tokio::test]
async fn field_violations_are_422() {
    let app = app().await;
    let mut body = entry_body("AB", 10);
    body["email"] = json!("not-an-email");
    let (status, body) = send(&app, "POST", "/api/v1/transactions/entry", Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("email"), "{}", message);
    assert!(message.contains("plate"), "{}", message);
}

#[tokio::test]
async fn unknown_transaction_is_404() {
    let app = app().await;
    let (status, body) = send(&app, "GET", "/api/v1/transactions/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn history_is_paginated() {
    let app = app().await;
    for (plate, space) in [("AAA-111", 10), ("BBB-222", 11), ("CCC-333", 12)] {
        send(&app, "POST", "/api/v1/transactions/entry", Some(entry_body(plate, space))).await;
    }
    let (status, body) = send(&app, "GET", "/api/v1/transactions?status=active&page=1&limit=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["total_pages"], 2);

    let (status, _) = send(&app, "GET", "/api/v1/transactions?status=parked", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn tariff_preview_prices_a_window() {
    let app = app().await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/tariffs/preview",
        Some(json!({
            "parking_id": 1,
            "entry_time": "2024-03-01T08:00:00Z",
            "exit_time": "2024-03-01T09:30:00Z"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let amount: Decimal = body["data"]["amount"].as_str().unwrap().parse().unwrap();
    assert_eq!(amount, Decimal::new(300, 2));
    assert_eq!(body["data"]["billable_minutes"], 90);
    assert_eq!(body["data"]["rate_ids"], json!([1]));
}

#[tokio::test]
async fn space_toggle_over_http() {
    let app = app().await;
    let (status, body) = send(
        &app,
        "PUT",
        "/api/v1/spaces/12/status",
        Some(json!({ "status": "maintenance", "operator_id": 7 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["status"], "MAINTENANCE");

    let (status, _) = send(&app, "POST", "/api/v1/transactions/entry", Some(entry_body("ABC-123", 12))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn health_and_request_id() {
    let app = app().await;
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let resp = app.clone().into_service().call(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));

    let (_, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"]["reachable"], true);
    assert_eq!(body["vehicles_inside"], 0);
    assert_eq!(body["billing"]["rounding"], "per_minute");
    assert_eq!(body["billing"]["payment_policy"], "minimum");
    assert_eq!(body["billing"]["max_recommended_minutes"], 480);
}

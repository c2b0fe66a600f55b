use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use appointment_cell::handlers::AppointmentState;
use appointment_cell::router::appointment_routes;
use appointment_cell::services::{LogOnlyCalendarSync, LogOnlyNotifier};
use shared_config::AppConfig;
use shared_database::InMemoryBookingStore;
use shared_utils::test_utils::LocationFixture;

async fn setup() -> (Router, Uuid, Uuid) {
    let store = Arc::new(InMemoryBookingStore::new());
    let tenant_id = Uuid::new_v4();
    let location = LocationFixture::new(tenant_id, "Centro", "America/Sao_Paulo");
    store.add_location(location.clone()).await;

    let state = AppointmentState {
        store,
        config: Arc::new(AppConfig::default()),
        notifier: Arc::new(LogOnlyNotifier),
        calendar: Arc::new(LogOnlyCalendarSync),
    };
    (appointment_routes(state), tenant_id, location.id)
}

async fn send(app: &Router, method: Method, uri: String, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn booking_body(start_at: &str) -> Value {
    json!({
        "patient_name": "Ana Souza",
        "patient_phone": "+55 11 91234-5678",
        "start_at": start_at,
        "duration_minutes": 30
    })
}

#[tokio::test]
async fn test_book_then_conflict() {
    let (app, tenant_id, location_id) = setup().await;
    let uri = format!("/tenants/{}/appointments", tenant_id);

    // Thursday 10:00 in Sao Paulo.
    let (status, body) = send(&app, Method::POST, uri.clone(), Some(booking_body("2030-01-10T13:00:00Z"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["appointment"]["status"], "pending");
    assert_eq!(body["appointment"]["location_id"], location_id.to_string());

    let (status, body) = send(&app, Method::POST, uri, Some(booking_body("2030-01-10T13:15:00Z"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("no longer available"));
}

#[tokio::test]
async fn test_outside_hours_reports_local_diagnostics() {
    let (app, tenant_id, _) = setup().await;

    // Thursday 19:00 in Sao Paulo.
    let (status, body) = send(
        &app,
        Method::POST,
        format!("/tenants/{}/appointments", tenant_id),
        Some(booking_body("2030-01-10T22:00:00Z")),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"]["kind"], "outside_business_hours");
    assert_eq!(body["details"]["timezone"], "America/Sao_Paulo");
    assert_eq!(body["details"]["local_weekday"], "Thu");
    assert_eq!(body["details"]["local_hour"], 19);
}

#[tokio::test]
async fn test_invalid_phone_is_rejected() {
    let (app, tenant_id, _) = setup().await;
    let mut body = booking_body("2030-01-10T13:00:00Z");
    body["patient_phone"] = json!("abc");

    let (status, _) = send(&app, Method::POST, format!("/tenants/{}/appointments", tenant_id), Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_transition_endpoint_lists_next_actions() {
    let (app, tenant_id, _) = setup().await;
    let (_, created) = send(
        &app,
        Method::POST,
        format!("/tenants/{}/appointments", tenant_id),
        Some(booking_body("2030-01-10T13:00:00Z")),
    )
    .await;
    let appointment_id = created["appointment"]["id"].as_str().unwrap().to_string();
    let uri = format!("/tenants/{}/appointments/{}/transition", tenant_id, appointment_id);

    let (status, body) = send(&app, Method::POST, uri.clone(), Some(json!({ "action": "confirm" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["appointment"]["status"], "confirmed");
    assert_eq!(body["next_actions"].as_array().unwrap().len(), 4);

    let (status, body) = send(&app, Method::POST, uri, Some(json!({ "action": "confirm" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"]["kind"], "invalid_status_transition");

    let (status, _) = send(
        &app,
        Method::POST,
        format!("/tenants/{}/appointments/{}/transition", tenant_id, Uuid::new_v4()),
        Some(json!({ "action": "cancel" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_block_endpoints() {
    let (app, tenant_id, location_id) = setup().await;

    let (status, body) = send(
        &app,
        Method::POST,
        format!("/tenants/{}/blocks", tenant_id),
        Some(json!({
            "location_id": location_id,
            "start_at": "2030-01-10T15:00:00Z",
            "end_at": "2030-01-10T16:00:00Z",
            "reason": "Reunião"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let block_id = body["block"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        Method::POST,
        format!("/tenants/{}/blocks", tenant_id),
        Some(json!({
            "start_at": "2030-01-10T16:00:00Z",
            "end_at": "2030-01-10T15:00:00Z"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!("/tenants/{}/blocks/{}", tenant_id, block_id);
    let (status, _) = send(&app, Method::DELETE, uri.clone(), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::DELETE, uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use appointment_cell::handlers::AppointmentState;
use appointment_cell::router::appointment_routes;
use appointment_cell::services::{AppointmentNotifier, CalendarSync};
use availability_cell::handlers::AvailabilityState;
use availability_cell::router::availability_routes;
use shared_config::AppConfig;
use shared_database::BookingStore;

/// Everything the cells share for the lifetime of the process.
pub struct Services {
    pub store: Arc<dyn BookingStore>,
    pub config: Arc<AppConfig>,
    pub notifier: Arc<dyn AppointmentNotifier>,
    pub calendar: Arc<dyn CalendarSync>,
}

pub fn create_router(services: Services) -> Router {
    let availability = AvailabilityState {
        store: services.store.clone(),
        config: services.config.clone(),
    };
    let appointments = AppointmentState {
        store: services.store,
        config: services.config,
        notifier: services.notifier,
        calendar: services.calendar,
    };

    Router::new()
        .route("/", get(|| async { "Booking API is running!" }))
        .route("/health", get(health))
        .merge(availability_routes(availability))
        .merge(appointment_routes(appointments))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use appointment_cell::services::{LogOnlyCalendarSync, LogOnlyNotifier};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use shared_database::InMemoryBookingStore;
    use shared_utils::test_utils::LocationFixture;
    use tower::ServiceExt;
    use uuid::Uuid;

    async fn app() -> (Router, Uuid, Uuid) {
        let store = Arc::new(InMemoryBookingStore::new());
        let tenant_id = Uuid::new_v4();
        let location = LocationFixture::new(tenant_id, "Centro", "America/Sao_Paulo");
        store.add_location(location.clone()).await;

        let router = create_router(Services {
            store,
            config: Arc::new(AppConfig::default()),
            notifier: Arc::new(LogOnlyNotifier),
            calendar: Arc::new(LogOnlyCalendarSync),
        });
        (router, tenant_id, location.id)
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (app, _, _) = app().await;
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn both_cells_are_mounted() {
        let (app, tenant_id, location_id) = app().await;

        let slots = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!(
                        "/tenants/{}/availability/slots?date=2030-01-10&location_id={}",
                        tenant_id, location_id
                    ))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(slots.status(), StatusCode::OK);

        let missing_block = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/tenants/{}/blocks/{}", tenant_id, Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(missing_block.status(), StatusCode::NOT_FOUND);
    }
}

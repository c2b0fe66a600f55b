// libs/availability-cell/src/router.rs
use axum::{routing::get, Router};

use crate::handlers::{self, AvailabilityState};

pub fn availability_routes(state: AvailabilityState) -> Router {
    Router::new()
        .route("/tenants/{tenant_id}/availability/slots", get(handlers::list_available_slots))
        .route("/tenants/{tenant_id}/availability/next-dates", get(handlers::find_next_available_dates))
        .with_state(state)
}

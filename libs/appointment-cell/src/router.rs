// libs/appointment-cell/src/router.rs
use axum::{
    routing::{delete, post},
    Router,
};

use crate::handlers::{self, AppointmentState};

pub fn appointment_routes(state: AppointmentState) -> Router {
    Router::new()
        .route("/tenants/{tenant_id}/appointments", post(handlers::book_appointment))
        .route(
            "/tenants/{tenant_id}/appointments/{appointment_id}/transition",
            post(handlers::transition_appointment),
        )
        .route("/tenants/{tenant_id}/blocks", post(handlers::create_block))
        .route("/tenants/{tenant_id}/blocks/{block_id}", delete(handlers::delete_block))
        .with_state(state)
}

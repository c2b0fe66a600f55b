// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::BookingStore;
use shared_models::error::AppError;

use crate::models::{BookAppointmentRequest, BookingError, CreateBlockRequest, TransitionAction};
use crate::services::blocks::AvailabilityBlockService;
use crate::services::booking::AppointmentBookingService;
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::notifications::{AppointmentNotifier, CalendarSync};

#[derive(Clone)]
pub struct AppointmentState {
    pub store: Arc<dyn BookingStore>,
    pub config: Arc<AppConfig>,
    pub notifier: Arc<dyn AppointmentNotifier>,
    pub calendar: Arc<dyn CalendarSync>,
}

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<AppointmentState>,
    Path(tenant_id): Path<Uuid>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let booking_service = AppointmentBookingService::new(
        state.store.clone(),
        state.notifier.clone(),
        state.calendar.clone(),
        &state.config,
    );

    let appointment = booking_service.book_appointment(tenant_id, request, Utc::now()).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "appointment": appointment,
            "message": "Appointment booked, awaiting confirmation"
        })),
    ))
}

#[axum::debug_handler]
pub async fn transition_appointment(
    State(state): State<AppointmentState>,
    Path((tenant_id, appointment_id)): Path<(Uuid, Uuid)>,
    Json(action): Json<TransitionAction>,
) -> Result<Json<Value>, AppError> {
    let lifecycle = AppointmentLifecycleService::new(state.store.clone());
    let appointment = lifecycle.transition(tenant_id, appointment_id, action).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "next_actions": AppointmentLifecycleService::get_valid_actions(appointment.status)
    })))
}

// ==============================================================================
// AVAILABILITY BLOCK HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_block(
    State(state): State<AppointmentState>,
    Path(tenant_id): Path<Uuid>,
    Json(request): Json<CreateBlockRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let block = AvailabilityBlockService::new(state.store.clone())
        .create_block(tenant_id, request)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "block": block
        })),
    ))
}

#[axum::debug_handler]
pub async fn delete_block(
    State(state): State<AppointmentState>,
    Path((tenant_id, block_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, AppError> {
    AvailabilityBlockService::new(state.store.clone())
        .delete_block(tenant_id, block_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Availability block deleted"
    })))
}

// ==============================================================================
// ERROR MAPPING
// ==============================================================================

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        let message = err.to_string();
        match err {
            BookingError::InvalidService
            | BookingError::InvalidProvider
            | BookingError::LocationNotFound
            | BookingError::AppointmentNotFound
            | BookingError::BlockNotFound => AppError::NotFound(message),

            BookingError::PausedService => business_rule(message, json!({ "kind": "paused_service" })),
            BookingError::PausedProvider => business_rule(message, json!({ "kind": "paused_provider" })),
            BookingError::NoLocationConfigured => {
                business_rule(message, json!({ "kind": "no_location_configured" }))
            }
            BookingError::InvalidTimezone(zone) => {
                business_rule(message, json!({ "kind": "invalid_timezone", "timezone": zone }))
            }
            BookingError::OutsideBusinessHours {
                timezone,
                local_weekday,
                local_hour,
                local_time,
            } => business_rule(
                message,
                json!({
                    "kind": "outside_business_hours",
                    "timezone": timezone,
                    "local_weekday": local_weekday,
                    "local_hour": local_hour,
                    "local_time": local_time
                }),
            ),
            BookingError::InvalidStatusTransition { from, action } => business_rule(
                message,
                json!({ "kind": "invalid_status_transition", "from": from, "action": action }),
            ),

            BookingError::SlotTaken => AppError::Conflict(message),

            BookingError::InvalidDate(_) | BookingError::InvalidWindow(_) => AppError::BadRequest(message),
            BookingError::InvalidPhone(_) => AppError::ValidationError(message),

            BookingError::StorageUnavailable(_) => AppError::Database(message),
        }
    }
}

fn business_rule(message: String, details: Value) -> AppError {
    AppError::BusinessRule { message, details }
}

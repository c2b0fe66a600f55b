// libs/availability-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::BookingStore;
use shared_models::error::AppError;

use crate::models::{AvailabilityError, NextDatesQuery, SlotQuery, DEFAULT_DURATION_MINUTES};
use crate::services::availability::AvailabilityService;

#[derive(Clone)]
pub struct AvailabilityState {
    pub store: Arc<dyn BookingStore>,
    pub config: Arc<AppConfig>,
}

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct SlotQueryParams {
    pub date: String,
    pub location_id: Uuid,
    pub duration_minutes: Option<i64>,
    pub provider_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct NextDatesQueryParams {
    pub from: Option<String>,
    pub location_id: Uuid,
    pub duration_minutes: Option<i64>,
    pub provider_id: Option<Uuid>,
    pub horizon_days: Option<u32>,
    pub limit: Option<usize>,
}

fn parse_date(raw: &str) -> Result<NaiveDate, AvailabilityError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| AvailabilityError::InvalidDate(raw.to_string()))
}

// ==============================================================================
// HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_available_slots(
    State(state): State<AvailabilityState>,
    Path(tenant_id): Path<Uuid>,
    Query(params): Query<SlotQueryParams>,
) -> Result<Json<Value>, AppError> {
    let query = SlotQuery {
        date: parse_date(&params.date)?,
        location_id: params.location_id,
        duration_minutes: params.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES),
        provider_id: params.provider_id,
    };

    let service = AvailabilityService::new(state.store.clone(), &state.config);
    let listing = service.list_available_slots(tenant_id, &query, Utc::now()).await?;

    Ok(Json(json!({
        "success": true,
        "availability": listing
    })))
}

#[axum::debug_handler]
pub async fn find_next_available_dates(
    State(state): State<AvailabilityState>,
    Path(tenant_id): Path<Uuid>,
    Query(params): Query<NextDatesQueryParams>,
) -> Result<Json<Value>, AppError> {
    let from = match params.from.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => Utc::now().date_naive(),
    };

    let query = NextDatesQuery {
        from,
        location_id: params.location_id,
        duration_minutes: params.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES),
        provider_id: params.provider_id,
        horizon_days: params.horizon_days,
        limit: params.limit,
    };

    let service = AvailabilityService::new(state.store.clone(), &state.config);
    let next = service.find_next_available_dates(tenant_id, &query, Utc::now()).await?;

    Ok(Json(json!({
        "success": true,
        "availability": next
    })))
}

// ==============================================================================
// ERROR MAPPING
// ==============================================================================

impl From<AvailabilityError> for AppError {
    fn from(err: AvailabilityError) -> Self {
        match err {
            AvailabilityError::LocationNotFound => AppError::NotFound(err.to_string()),
            AvailabilityError::InvalidProvider => AppError::NotFound(err.to_string()),
            AvailabilityError::PausedProvider => AppError::BusinessRule {
                message: err.to_string(),
                details: json!({ "kind": "paused_provider" }),
            },
            AvailabilityError::InvalidTimezone(ref zone) => AppError::BusinessRule {
                message: err.to_string(),
                details: json!({ "kind": "invalid_timezone", "timezone": zone }),
            },
            AvailabilityError::InvalidDate(_) | AvailabilityError::InvalidWindow(_) => {
                AppError::BadRequest(err.to_string())
            }
            AvailabilityError::StorageUnavailable(_) => AppError::Database(err.to_string()),
        }
    }
}

// libs/availability-cell/src/services/availability.rs
use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::BookingStore;
use shared_models::{Location, Provider};

use crate::models::{
    AvailabilityError, NextDatesQuery, NextDatesResponse, ResolvedSchedule, SlotListResponse, SlotQuery,
    MAX_DURATION_MINUTES,
};
use crate::services::conflict::{ConflictDataProvider, ConflictScope};
use crate::services::scanner::{MultiDayScanner, ScanOptions};
use crate::services::schedule::ScheduleResolver;
use crate::services::slots::SlotEnumerator;

/// Upper bound on caller-supplied scan horizons.
const MAX_HORIZON_DAYS: u32 = 90;

/// Location, provider and resolved hours for one availability question.
pub struct AvailabilityTarget {
    pub location: Location,
    pub provider: Option<Provider>,
    pub resolved: ResolvedSchedule,
}

impl AvailabilityTarget {
    pub fn scope(&self) -> ConflictScope {
        ConflictScope::new(
            self.location.id,
            self.provider.as_ref().map(|p| p.id),
            self.resolved.buffer_minutes,
        )
    }
}

pub struct AvailabilityService {
    store: Arc<dyn BookingStore>,
    options: ScanOptions,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn BookingStore>, config: &AppConfig) -> Self {
        Self {
            store,
            options: ScanOptions::from(config),
        }
    }

    pub fn with_options(store: Arc<dyn BookingStore>, options: ScanOptions) -> Self {
        Self { store, options }
    }

    /// Loads the location and optional provider and resolves their hours.
    pub async fn load_target(
        &self,
        tenant_id: Uuid,
        location_id: Uuid,
        provider_id: Option<Uuid>,
    ) -> Result<AvailabilityTarget, AvailabilityError> {
        let location = self
            .store
            .get_location_by_id(tenant_id, location_id)
            .await?
            .ok_or(AvailabilityError::LocationNotFound)?;

        let provider = match provider_id {
            Some(provider_id) => {
                let provider = self
                    .store
                    .get_provider_by_id(tenant_id, provider_id)
                    .await?
                    .ok_or(AvailabilityError::InvalidProvider)?;
                if !provider.active {
                    return Err(AvailabilityError::PausedProvider);
                }
                Some(provider)
            }
            None => None,
        };

        let resolved = ScheduleResolver::resolve(&location, provider.as_ref())?;

        Ok(AvailabilityTarget {
            location,
            provider,
            resolved,
        })
    }

    pub async fn list_available_slots(
        &self,
        tenant_id: Uuid,
        query: &SlotQuery,
        now: DateTime<Utc>,
    ) -> Result<SlotListResponse, AvailabilityError> {
        let duration = validate_duration(query.duration_minutes)?;
        let target = self.load_target(tenant_id, query.location_id, query.provider_id).await?;
        let scope = target.scope();

        let window = SlotEnumerator::fetch_window(query.date, query.date, &target.resolved)
            .ok_or_else(|| {
                AvailabilityError::InvalidDate(format!("{} is outside the supported calendar", query.date))
            })?;
        let conflicts = ConflictDataProvider::new(self.store.clone())
            .fetch(tenant_id, window, target.location.id)
            .await?;

        let slots = SlotEnumerator::enumerate(query.date, &target.resolved, duration, &conflicts, &scope, now);

        debug!(
            "Listed {} slots on {} at location {} ({:?} schedule)",
            slots.len(),
            query.date,
            target.location.id,
            target.resolved.source
        );

        Ok(SlotListResponse {
            date: query.date,
            location_id: target.location.id,
            timezone: target.resolved.timezone.name().to_string(),
            duration_minutes: duration,
            slots,
        })
    }

    pub async fn find_next_available_dates(
        &self,
        tenant_id: Uuid,
        query: &NextDatesQuery,
        now: DateTime<Utc>,
    ) -> Result<NextDatesResponse, AvailabilityError> {
        let duration = validate_duration(query.duration_minutes)?;
        let target = self.load_target(tenant_id, query.location_id, query.provider_id).await?;

        let mut options = self.options;
        if let Some(horizon_days) = query.horizon_days {
            options.horizon_days = horizon_days.min(MAX_HORIZON_DAYS);
        }
        if let Some(limit) = query.limit {
            options.target_dates = limit;
        }
        validate_horizon(query.from, options.horizon_days, &target.resolved)?;

        let scanner = MultiDayScanner::new(ConflictDataProvider::new(self.store.clone()), options);
        let dates = scanner
            .scan(tenant_id, query.from, &target.resolved, duration, &target.scope(), now)
            .await;

        info!(
            "Found {} open dates from {} at location {}",
            dates.len(),
            query.from,
            target.location.id
        );

        Ok(NextDatesResponse {
            location_id: target.location.id,
            timezone: target.resolved.timezone.name().to_string(),
            dates,
        })
    }
}

/// The whole horizon must stay inside the representable calendar.
fn validate_horizon(from: NaiveDate, horizon_days: u32, resolved: &ResolvedSchedule) -> Result<(), AvailabilityError> {
    from.checked_add_days(Days::new(u64::from(horizon_days.saturating_sub(1))))
        .and_then(|last| SlotEnumerator::fetch_window(from, last, resolved))
        .map(|_| ())
        .ok_or_else(|| {
            AvailabilityError::InvalidDate(format!(
                "{} plus {} days is outside the supported calendar",
                from, horizon_days
            ))
        })
}

fn validate_duration(duration_minutes: i64) -> Result<i64, AvailabilityError> {
    if duration_minutes > MAX_DURATION_MINUTES {
        return Err(AvailabilityError::InvalidWindow(format!(
            "duration of {} minutes exceeds one day",
            duration_minutes
        )));
    }
    Ok(SlotEnumerator::effective_duration(duration_minutes))
}

// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{DateTime, Duration, Timelike, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use availability_cell::{
    fits_business_hours, ConflictDataProvider, ConflictScope, LocalWindow, ResolvedSchedule, ScheduleResolver,
    MAX_DURATION_MINUTES,
};
use shared_config::AppConfig;
use shared_database::BookingStore;
use shared_models::{Appointment, AppointmentStatus, NewAppointment, TimeWindow};
use shared_utils::normalize_phone;

use crate::models::{AppointmentCreatedNotice, BookAppointmentRequest, BookingError};
use crate::services::notifications::{dispatch_side_effects, AppointmentNotifier, CalendarSync};
use crate::services::resolver::EntityResolver;

pub struct AppointmentBookingService {
    store: Arc<dyn BookingStore>,
    resolver: EntityResolver,
    notifier: Arc<dyn AppointmentNotifier>,
    calendar: Arc<dyn CalendarSync>,
    default_country_code: String,
}

impl AppointmentBookingService {
    pub fn new(
        store: Arc<dyn BookingStore>,
        notifier: Arc<dyn AppointmentNotifier>,
        calendar: Arc<dyn CalendarSync>,
        config: &AppConfig,
    ) -> Self {
        Self {
            resolver: EntityResolver::new(store.clone()),
            store,
            notifier,
            calendar,
            default_country_code: config.default_country_code.clone(),
        }
    }

    /// Validates, re-checks conflicts and commits one `pending` appointment.
    ///
    /// The conflict check is optimistic; the store's exclusion constraint decides
    /// races and its violation surfaces as [`BookingError::SlotTaken`].
    pub async fn book_appointment(
        &self,
        tenant_id: Uuid,
        request: BookAppointmentRequest,
        now: DateTime<Utc>,
    ) -> Result<Appointment, BookingError> {
        debug!("Booking request for tenant {} at {}", tenant_id, request.start_at);

        let phone = normalize_phone(&request.patient_phone, &self.default_country_code)
            .map_err(|e| BookingError::InvalidPhone(e.to_string()))?;

        let service = self.resolver.resolve_service(tenant_id, request.service_id).await?;
        let duration = EntityResolver::resolve_duration(request.duration_minutes, service.as_ref());
        if duration > MAX_DURATION_MINUTES {
            return Err(BookingError::InvalidWindow(format!(
                "duration of {} minutes exceeds one day",
                duration
            )));
        }

        let provider = self.resolver.resolve_provider(tenant_id, request.provider_id).await?;
        let (location, _source) = self
            .resolver
            .resolve_location(tenant_id, request.location_id, provider.provider.as_ref())
            .await?;

        let patient = self
            .resolver
            .find_or_create_patient(tenant_id, &phone, &request.patient_name, request.patient_email.as_deref())
            .await?;

        let resolved = ScheduleResolver::resolve(&location, provider.requested_provider())?;
        let window = self.validate_window(request.start_at, duration, &resolved, now)?;

        let scope = ConflictScope::new(
            location.id,
            provider.requested_provider().map(|p| p.id),
            resolved.buffer_minutes,
        );
        let conflicts = ConflictDataProvider::new(self.store.clone())
            .fetch(tenant_id, window.padded(resolved.buffer_minutes), location.id)
            .await?;
        if let Some(reason) = scope.first_conflict(&conflicts, &window) {
            warn!(
                "Slot {} - {} at location {} already taken ({:?})",
                window.start, window.end, location.id, reason
            );
            return Err(BookingError::SlotTaken);
        }

        let appointment = self
            .store
            .insert_appointment(NewAppointment {
                tenant_id,
                location_id: location.id,
                provider_id: provider.provider_id(),
                patient_id: patient.id,
                service_id: service.as_ref().map(|s| s.id),
                start_at: window.start,
                end_at: window.end,
                status: AppointmentStatus::Pending,
                notes: request.notes,
            })
            .await
            .map_err(|e| {
                let err = BookingError::from(e);
                if err == BookingError::SlotTaken {
                    warn!("Lost booking race at location {} for {}", location.id, window.start);
                }
                err
            })?;

        info!(
            "Booked appointment {} for patient {} at location {} ({} - {})",
            appointment.id, patient.id, location.id, appointment.start_at, appointment.end_at
        );

        let notice = AppointmentCreatedNotice {
            appointment_id: appointment.id,
            tenant_id,
            phone: patient.phone.clone(),
            name: patient.name.clone(),
            start_at: appointment.start_at,
            location_name: location.name.clone(),
            provider_name: provider.provider.as_ref().map(|p| p.name.clone()),
        };
        dispatch_side_effects(self.notifier.clone(), self.calendar.clone(), notice, appointment.clone());

        Ok(appointment)
    }

    fn validate_window(
        &self,
        start_at: DateTime<Utc>,
        duration_minutes: i64,
        resolved: &ResolvedSchedule,
        now: DateTime<Utc>,
    ) -> Result<TimeWindow, BookingError> {
        if start_at <= now {
            return Err(BookingError::InvalidWindow(format!(
                "start {} is not in the future",
                start_at
            )));
        }

        let end_at = Duration::try_minutes(duration_minutes)
            .and_then(|length| start_at.checked_add_signed(length))
            .ok_or_else(|| {
                BookingError::InvalidWindow(format!("{} minutes from {} is out of range", duration_minutes, start_at))
            })?;
        if !fits_business_hours(start_at, end_at, &resolved.schedule, resolved.timezone) {
            let local = LocalWindow::new(start_at, end_at, resolved.timezone);
            debug!("Rejected {} - {} as outside business hours: {:?}", start_at, end_at, local);
            return Err(BookingError::OutsideBusinessHours {
                timezone: resolved.timezone.name().to_string(),
                local_weekday: local.weekday.to_string(),
                local_hour: local.start.hour(),
                local_time: local.start.format("%H:%M").to_string(),
            });
        }

        TimeWindow::new(start_at, end_at)
            .ok_or_else(|| BookingError::InvalidWindow(format!("empty window at {}", start_at)))
    }
}

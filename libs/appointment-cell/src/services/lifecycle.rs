// libs/appointment-cell/src/services/lifecycle.rs
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::{BookingStore, StoreError};
use shared_models::{Appointment, AppointmentStatus};

use crate::models::{BookingError, TransitionAction};

const MAX_TRANSITION_ATTEMPTS: u32 = 3;

pub struct AppointmentLifecycleService {
    store: Arc<dyn BookingStore>,
}

impl AppointmentLifecycleService {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    /// Status reached by applying `action` to `current`, if the state machine allows it.
    pub fn next_status(current: AppointmentStatus, action: TransitionAction) -> Option<AppointmentStatus> {
        use AppointmentStatus::*;

        match (current, action) {
            (Pending, TransitionAction::Confirm) => Some(Confirmed),
            (Pending | Confirmed, TransitionAction::Cancel) => Some(Canceled),
            (Confirmed, TransitionAction::Complete) => Some(Completed),
            (Confirmed, TransitionAction::MarkNoShow) => Some(NoShow),
            (Confirmed, TransitionAction::RequestReschedule) => Some(RescheduleRequested),
            (RescheduleRequested, TransitionAction::ResolveReschedule { keep: true }) => Some(Confirmed),
            (RescheduleRequested, TransitionAction::ResolveReschedule { keep: false }) => Some(Canceled),
            _ => None,
        }
    }

    pub fn validate_status_transition(
        current: AppointmentStatus,
        action: TransitionAction,
    ) -> Result<AppointmentStatus, BookingError> {
        Self::next_status(current, action).ok_or_else(|| {
            warn!("Invalid status transition attempted: {} on {}", action, current);
            BookingError::InvalidStatusTransition { from: current, action }
        })
    }

    /// Actions accepted from `current`; empty for terminal statuses.
    pub fn get_valid_actions(current: AppointmentStatus) -> Vec<TransitionAction> {
        [
            TransitionAction::Confirm,
            TransitionAction::Cancel,
            TransitionAction::Complete,
            TransitionAction::MarkNoShow,
            TransitionAction::RequestReschedule,
            TransitionAction::ResolveReschedule { keep: true },
            TransitionAction::ResolveReschedule { keep: false },
        ]
        .into_iter()
        .filter(|action| Self::next_status(current, *action).is_some())
        .collect()
    }

    /// Applies `action` with a compare-and-set on the status that was validated.
    /// When another writer moved the row first, the action is re-validated
    /// against the fresh status, so a terminal row is never revived.
    pub async fn transition(
        &self,
        tenant_id: Uuid,
        appointment_id: Uuid,
        action: TransitionAction,
    ) -> Result<Appointment, BookingError> {
        let mut attempt = 1;
        loop {
            let appointment = self
                .store
                .get_appointment(tenant_id, appointment_id)
                .await?
                .ok_or(BookingError::AppointmentNotFound)?;

            let next = Self::validate_status_transition(appointment.status, action)?;
            debug!("Applying {} to appointment {} ({} -> {})", action, appointment_id, appointment.status, next);

            match self
                .store
                .update_appointment_status(tenant_id, appointment_id, appointment.status, next)
                .await
            {
                Ok(updated) => {
                    info!("Appointment {} is now {}", appointment_id, updated.status);
                    return Ok(updated);
                }
                Err(StoreError::StatusChanged(_)) if attempt < MAX_TRANSITION_ATTEMPTS => {
                    warn!(
                        "Appointment {} left {} while applying {}, re-reading (attempt {})",
                        appointment_id, appointment.status, action, attempt
                    );
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AppointmentStatus::*;

    const ALL: [AppointmentStatus; 6] = [Pending, Confirmed, Canceled, Completed, NoShow, RescheduleRequested];

    #[test]
    fn terminal_statuses_accept_nothing() {
        for status in ALL.into_iter().filter(AppointmentStatus::is_terminal) {
            assert!(AppointmentLifecycleService::get_valid_actions(status).is_empty(), "{status}");
        }
    }

    #[test]
    fn happy_paths() {
        let confirm = AppointmentLifecycleService::validate_status_transition(Pending, TransitionAction::Confirm);
        assert_eq!(confirm, Ok(Confirmed));
        assert_eq!(AppointmentLifecycleService::next_status(Confirmed, TransitionAction::Complete), Some(Completed));
        assert_eq!(AppointmentLifecycleService::next_status(Confirmed, TransitionAction::MarkNoShow), Some(NoShow));
        assert_eq!(
            AppointmentLifecycleService::next_status(Confirmed, TransitionAction::RequestReschedule),
            Some(RescheduleRequested)
        );
        assert_eq!(
            AppointmentLifecycleService::next_status(RescheduleRequested, TransitionAction::ResolveReschedule { keep: true }),
            Some(Confirmed)
        );
        assert_eq!(
            AppointmentLifecycleService::next_status(RescheduleRequested, TransitionAction::ResolveReschedule { keep: false }),
            Some(Canceled)
        );
    }

    #[test]
    fn pending_cannot_be_attended() {
        assert_eq!(
            AppointmentLifecycleService::validate_status_transition(Pending, TransitionAction::Complete),
            Err(BookingError::InvalidStatusTransition {
                from: Pending,
                action: TransitionAction::Complete
            })
        );
        assert_eq!(
            AppointmentLifecycleService::get_valid_actions(Pending),
            vec![TransitionAction::Confirm, TransitionAction::Cancel]
        );
    }

    #[test]
    fn reschedule_request_cannot_be_canceled_directly() {
        assert_eq!(
            AppointmentLifecycleService::get_valid_actions(RescheduleRequested),
            vec![
                TransitionAction::ResolveReschedule { keep: true },
                TransitionAction::ResolveReschedule { keep: false }
            ]
        );
    }
}

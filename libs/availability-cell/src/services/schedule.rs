// libs/availability-cell/src/services/schedule.rs
use chrono_tz::Tz;
use tracing::debug;

use shared_models::{Location, Provider, WeeklySchedule};

use crate::models::{AvailabilityError, ResolvedSchedule, ScheduleSource};

/// Picks the weekly hours that govern a location, optionally narrowed to one provider.
///
/// Order: a non-empty provider override, then the location's own schedule, then
/// [`WeeklySchedule::business_default`]. Timezone and buffer always come from the
/// location.
pub struct ScheduleResolver;

impl ScheduleResolver {
    pub fn resolve(location: &Location, provider: Option<&Provider>) -> Result<ResolvedSchedule, AvailabilityError> {
        let timezone = parse_timezone(&location.timezone)?;

        let (schedule, source) = match provider {
            Some(provider) if !provider.schedule_override.is_empty() => {
                (provider.schedule_override.clone(), ScheduleSource::ProviderOverride)
            }
            _ if !location.schedule.is_empty() => (location.schedule.clone(), ScheduleSource::Location),
            _ => (WeeklySchedule::business_default(), ScheduleSource::BusinessDefault),
        };

        debug!(
            "Resolved {:?} schedule for location {} (provider {:?}, tz {})",
            source,
            location.id,
            provider.map(|p| p.id),
            timezone
        );

        Ok(ResolvedSchedule {
            schedule,
            timezone,
            buffer_minutes: i64::from(location.buffer_minutes.max(0)),
            source,
        })
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz, AvailabilityError> {
    name.parse::<Tz>()
        .map_err(|_| AvailabilityError::InvalidTimezone(name.to_string()))
}

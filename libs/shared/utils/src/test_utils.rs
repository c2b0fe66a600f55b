use chrono::{NaiveTime, Weekday};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::{Location, Provider, Service, TimeRange, WeeklySchedule};

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub default_country_code: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "test-service-key".to_string(),
            default_country_code: "55".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            supabase_url: url.into(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
            default_country_code: self.default_country_code.clone(),
            ..AppConfig::default()
        }
    }
}

/// `"HH:MM"` -> `NaiveTime`, panicking on typos in test fixtures.
pub fn at(hhmm: &str) -> NaiveTime {
    NaiveTime::parse_from_str(hhmm, "%H:%M").unwrap_or_else(|_| panic!("bad fixture time {hhmm}"))
}

pub fn hours(open: &str, close: &str) -> TimeRange {
    TimeRange::new(at(open), at(close)).unwrap_or_else(|e| panic!("bad fixture range: {e}"))
}

/// Same hours on each of `days`.
pub fn schedule_on(days: &[Weekday], open: &str, close: &str) -> WeeklySchedule {
    days.iter()
        .fold(WeeklySchedule::new(), |schedule, day| schedule.with_range(*day, hours(open, close)))
}

pub const WEEKDAYS: [Weekday; 5] = [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri];

pub struct LocationFixture;

impl LocationFixture {
    pub fn new(tenant_id: Uuid, name: &str, timezone: &str) -> Location {
        Location {
            id: Uuid::new_v4(),
            tenant_id,
            name: name.to_string(),
            timezone: timezone.to_string(),
            schedule: schedule_on(&WEEKDAYS, "09:00", "18:00"),
            buffer_minutes: 0,
        }
    }

    pub fn with_schedule(mut location: Location, schedule: WeeklySchedule) -> Location {
        location.schedule = schedule;
        location
    }

    pub fn with_buffer(mut location: Location, buffer_minutes: i32) -> Location {
        location.buffer_minutes = buffer_minutes;
        location
    }
}

pub struct ProviderFixture;

impl ProviderFixture {
    pub fn new(tenant_id: Uuid, name: &str, default_location_id: Option<Uuid>) -> Provider {
        Provider {
            id: Uuid::new_v4(),
            tenant_id,
            name: name.to_string(),
            active: true,
            default_location_id,
            schedule_override: WeeklySchedule::new(),
        }
    }

    pub fn paused(mut provider: Provider) -> Provider {
        provider.active = false;
        provider
    }
}

pub struct ServiceFixture;

impl ServiceFixture {
    pub fn new(tenant_id: Uuid, name: &str, duration_minutes: Option<i32>) -> Service {
        Service {
            id: Uuid::new_v4(),
            tenant_id,
            name: name.to_string(),
            active: true,
            duration_minutes,
        }
    }
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn location_row(location: &Location) -> serde_json::Value {
        serde_json::to_value(location).unwrap_or_default()
    }

    pub fn provider_row(provider: &Provider) -> serde_json::Value {
        serde_json::to_value(provider).unwrap_or_default()
    }

    /// PostgREST body for a violated exclusion constraint.
    pub fn exclusion_violation() -> serde_json::Value {
        serde_json::json!({
            "code": "23P01",
            "details": "Key conflicts with existing key.",
            "hint": null,
            "message": "conflicting key value violates exclusion constraint \"appointments_no_overlap\""
        })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        serde_json::json!({
            "code": code,
            "message": message
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default().to_app_config();

        assert_eq!(config.supabase_url, "http://localhost:54321");
        assert!(config.is_storage_configured());
        assert_eq!(config.scan_horizon_days, 14);
    }

    #[test]
    fn location_fixture_defaults_to_office_hours() {
        let location = LocationFixture::new(Uuid::new_v4(), "Centro", "America/Sao_Paulo");
        assert_eq!(location.schedule.ranges_for(Weekday::Thu), &[hours("09:00", "18:00")]);
        assert!(location.schedule.ranges_for(Weekday::Sun).is_empty());
    }
}

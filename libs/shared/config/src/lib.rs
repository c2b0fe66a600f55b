use std::env;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub default_country_code: String,
    pub scan_horizon_days: u32,
    pub scan_chunk_days: u32,
    pub scan_target_dates: usize,
    pub preview_slots: usize,
    pub notification_webhook_url: Option<String>,
    pub calendar_sync_webhook_url: Option<String>,
    pub bind_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_service_key: String::new(),
            default_country_code: "55".to_string(),
            scan_horizon_days: 14,
            scan_chunk_days: 7,
            scan_target_dates: 5,
            preview_slots: 6,
            notification_webhook_url: None,
            calendar_sync_webhook_url: None,
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_service_key: env::var("SUPABASE_SERVICE_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_KEY not set, using empty value");
                    String::new()
                }),
            default_country_code: env::var("BOOKING_DEFAULT_COUNTRY_CODE")
                .unwrap_or_else(|_| defaults.default_country_code.clone()),
            scan_horizon_days: parse_or("BOOKING_SCAN_HORIZON_DAYS", defaults.scan_horizon_days),
            scan_chunk_days: parse_or("BOOKING_SCAN_CHUNK_DAYS", defaults.scan_chunk_days),
            scan_target_dates: parse_or("BOOKING_SCAN_TARGET_DATES", defaults.scan_target_dates),
            preview_slots: parse_or("BOOKING_PREVIEW_SLOTS", defaults.preview_slots),
            notification_webhook_url: env::var("NOTIFICATION_WEBHOOK_URL").ok()
                .filter(|url| !url.is_empty()),
            calendar_sync_webhook_url: env::var("CALENDAR_SYNC_WEBHOOK_URL").ok()
                .filter(|url| !url.is_empty()),
            bind_addr: env::var("BIND_ADDR")
                .unwrap_or_else(|_| defaults.bind_addr.clone()),
        };

        if !config.is_storage_configured() {
            warn!("Storage not configured - falling back to the in-memory store");
        }

        config
    }

    pub fn is_storage_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_service_key.is_empty()
    }
}

fn parse_or<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value {:?}, using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

//! Validated settings

use crate::schema::{RawConfig, RawScheduleConfig, RawServiceConfig};
use std::path::PathBuf;
use std::time::Duration;
use timeclock_util::{default_data_dir, default_socket_path};

pub const DEFAULT_BASE_URL: &str = "https://api.factorialhr.com";
pub const DEFAULT_RETURN_HOST: &str = "factorialhr.es";
pub const DEFAULT_WORKDAY_HOURS: u8 = 8;
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_LOGIN_DELAY: Duration = Duration::from_secs(3);
pub const DEFAULT_RESUME_POLL: Duration = Duration::from_secs(5);

/// Validated settings ready for use by the daemon
#[derive(Debug, Clone)]
pub struct Settings {
    pub service: ServiceConfig,

    /// Hours in a workday, 1-24
    pub workday_hours: u8,

    pub schedule: ScheduleConfig,
}

impl Settings {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        let workday_hours = raw
            .workday
            .hours
            .map(|h| h as u8)
            .unwrap_or(DEFAULT_WORKDAY_HOURS);

        Self {
            service: ServiceConfig::from_raw(raw.service),
            workday_hours,
            schedule: ScheduleConfig::from_raw(raw.schedule),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            workday_hours: DEFAULT_WORKDAY_HOURS,
            schedule: ScheduleConfig::default(),
        }
    }
}

/// Connection and daemon settings
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Base URL without trailing slash
    pub base_url: String,
    pub return_host: String,
    pub socket_path: PathBuf,
    pub data_dir: PathBuf,
    pub request_timeout: Option<Duration>,
}

impl ServiceConfig {
    fn from_raw(raw: RawServiceConfig) -> Self {
        Self {
            base_url: raw
                .base_url
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            return_host: raw
                .return_host
                .unwrap_or_else(|| DEFAULT_RETURN_HOST.to_string()),
            socket_path: raw.socket_path.unwrap_or_else(default_socket_path),
            data_dir: raw.data_dir.unwrap_or_else(default_data_dir),
            request_timeout: raw.request_timeout_seconds.map(Duration::from_secs),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::from_raw(RawServiceConfig::default())
    }
}

/// Timer settings
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub refresh_interval: Duration,
    pub login_delay: Duration,
    /// None disables resume detection
    pub resume_poll: Option<Duration>,
}

impl ScheduleConfig {
    fn from_raw(raw: RawScheduleConfig) -> Self {
        Self {
            refresh_interval: raw
                .refresh_interval_seconds
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_REFRESH_INTERVAL),
            login_delay: raw
                .login_delay_seconds
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_LOGIN_DELAY),
            resume_poll: match raw.resume_poll_seconds {
                Some(0) => None,
                Some(secs) => Some(Duration::from_secs(secs)),
                None => Some(DEFAULT_RESUME_POLL),
            },
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self::from_raw(RawScheduleConfig::default())
    }
}

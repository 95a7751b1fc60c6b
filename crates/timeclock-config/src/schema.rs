//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Connection and daemon settings
    #[serde(default)]
    pub service: RawServiceConfig,

    /// Workday length
    #[serde(default)]
    pub workday: RawWorkdayConfig,

    /// Timers
    #[serde(default)]
    pub schedule: RawScheduleConfig,
}

/// Service-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceConfig {
    /// Base URL of the HR service (default: https://api.factorialhr.com)
    pub base_url: Option<String>,

    /// Value sent as `return_host` on sign-in
    pub return_host: Option<String>,

    /// IPC socket path
    pub socket_path: Option<PathBuf>,

    /// Data directory (credentials file lives here)
    pub data_dir: Option<PathBuf>,

    /// Per-request timeout. Unset means the HTTP client default.
    pub request_timeout_seconds: Option<u64>,
}

/// Workday settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawWorkdayConfig {
    /// Hours in a workday, 1-24 (default: 8)
    pub hours: Option<i64>,
}

/// Timer settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawScheduleConfig {
    /// How often the status projection is recomputed (default: 60)
    pub refresh_interval_seconds: Option<u64>,

    /// Delay between startup and the synthetic login signal (default: 3)
    pub login_delay_seconds: Option<u64>,

    /// How often the resume detector samples the clocks (default: 5, 0 disables)
    pub resume_poll_seconds: Option<u64>,
}

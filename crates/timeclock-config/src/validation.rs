//! Configuration validation

use crate::schema::RawConfig;
use thiserror::Error;
use url::Url;

/// Smallest and largest accepted workday length
pub const MIN_WORKDAY_HOURS: i64 = 1;
pub const MAX_WORKDAY_HOURS: i64 = 24;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Workday hours must be between 1 and 24, got {0}")]
    WorkdayHoursOutOfRange(i64),

    #[error("Invalid base URL '{value}': {message}")]
    InvalidBaseUrl { value: String, message: String },

    #[error("{field} must be greater than zero")]
    ZeroInterval { field: &'static str },
}

/// Validate a raw configuration, collecting every problem
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(hours) = config.workday.hours
        && let Err(e) = validate_workday_hours(hours)
    {
        errors.push(e);
    }

    if let Some(url) = &config.service.base_url
        && let Err(message) = validate_base_url(url)
    {
        errors.push(ValidationError::InvalidBaseUrl {
            value: url.clone(),
            message,
        });
    }

    if config.service.request_timeout_seconds == Some(0) {
        errors.push(ValidationError::ZeroInterval {
            field: "service.request_timeout_seconds",
        });
    }

    if config.schedule.refresh_interval_seconds == Some(0) {
        errors.push(ValidationError::ZeroInterval {
            field: "schedule.refresh_interval_seconds",
        });
    }

    errors
}

/// Check a workday length in hours
pub fn validate_workday_hours(hours: i64) -> Result<u8, ValidationError> {
    if !(MIN_WORKDAY_HOURS..=MAX_WORKDAY_HOURS).contains(&hours) {
        return Err(ValidationError::WorkdayHoursOutOfRange(hours));
    }
    Ok(hours as u8)
}

fn validate_base_url(raw: &str) -> Result<(), String> {
    let parsed = Url::parse(raw.trim()).map_err(|e| e.to_string())?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported scheme '{}'", other)),
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err("missing host".into());
    }
    if !parsed.username().is_empty() || parsed.password().is_some() {
        return Err("must not embed credentials".into());
    }
    // Request paths are appended to the base
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err("must not have a query or fragment".into());
    }
    Ok(())
}

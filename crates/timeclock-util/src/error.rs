//! Error types for timeclockd

use thiserror::Error;

/// Core error type for timeclockd operations
#[derive(Debug, Error)]
pub enum TimeclockError {
    /// Missing or invalid local settings
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Credential rejection or use of the client before login
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Transport failure or unexpected response from the HR service
    #[error("API error: {0}")]
    ApiError(String),

    /// The OS signal source could not be set up
    #[error("System event error: {0}")]
    SystemEventError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TimeclockError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        Self::AuthError(msg.into())
    }

    pub fn api(msg: impl Into<String>) -> Self {
        Self::ApiError(msg.into())
    }

    pub fn system_event(msg: impl Into<String>) -> Self {
        Self::SystemEventError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Authentication failures are a kind of API failure.
    pub fn is_api_failure(&self) -> bool {
        matches!(self, Self::ApiError(_) | Self::AuthError(_))
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthError(_))
    }
}

pub type Result<T> = std::result::Result<T, TimeclockError>;

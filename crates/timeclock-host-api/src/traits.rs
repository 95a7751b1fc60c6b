//! Host collaborator traits

use async_trait::async_trait;
use thiserror::Error;
use timeclock_api::{Secret, Signal};
use timeclock_util::TimeclockError;
use tokio::sync::mpsc;

/// Errors from host collaborators
#[derive(Debug, Error)]
pub enum HostError {
    /// Could not hook into the OS notification mechanism
    #[error("Event source registration failed: {0}")]
    RegistrationFailed(String),

    #[error("Credential store error: {0}")]
    CredentialStore(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<HostError> for TimeclockError {
    fn from(e: HostError) -> Self {
        match e {
            HostError::RegistrationFailed(msg) => TimeclockError::system_event(msg),
            other => TimeclockError::internal(other.to_string()),
        }
    }
}

pub type HostResult<T> = Result<T, HostError>;

/// Email and password pair read from a [`CredentialStore`]
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: Secret,
}

/// Where the HR service credentials live. A pure lookup from the core's
/// point of view; the storage format belongs to the implementation.
pub trait CredentialStore: Send + Sync {
    fn get_email(&self) -> Option<String>;

    fn get_password(&self, email: &str) -> Option<String>;

    fn set_credentials(&self, email: &str, password: &str) -> HostResult<()>;

    fn clear_credentials(&self) -> HostResult<()>;

    fn has_credentials(&self) -> bool {
        self.credentials().is_some()
    }

    /// Both halves, or None if either is missing
    fn credentials(&self) -> Option<Credentials> {
        let email = self.get_email()?;
        let password = self.get_password(&email)?;
        Some(Credentials {
            email,
            password: Secret::new(password),
        })
    }
}

/// Sending half of the daemon's signal queue
pub type SignalSender = mpsc::UnboundedSender<Signal>;

/// A source of OS lifecycle signals.
///
/// Implementations push typed [`Signal`] values onto the shared queue; the
/// daemon consumes them one at a time.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Register with the OS and forward signals until the receiver is gone.
    ///
    /// Returns `RegistrationFailed` if the source cannot be set up.
    async fn run(&self, tx: SignalSender) -> HostResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_failure_maps_to_system_event_error() {
        let err: TimeclockError = HostError::RegistrationFailed("no SIGUSR1".into()).into();
        assert!(matches!(err, TimeclockError::SystemEventError(_)));
    }
}

//! In-memory host collaborators for testing

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use timeclock_api::Signal;

use crate::{CredentialStore, EventSource, HostError, HostResult, SignalSender};

/// Credential store backed by memory
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: Mutex<Option<(String, String)>>,

    /// Configure writes to fail
    pub fail_writes: Mutex<bool>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(email: &str, password: &str) -> Self {
        Self {
            inner: Mutex::new(Some((email.to_string(), password.to_string()))),
            fail_writes: Mutex::new(false),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get_email(&self) -> Option<String> {
        self.inner
            .lock()
            .ok()?
            .as_ref()
            .map(|(email, _)| email.clone())
    }

    fn get_password(&self, email: &str) -> Option<String> {
        self.inner
            .lock()
            .ok()?
            .as_ref()
            .filter(|(stored, _)| stored == email)
            .map(|(_, password)| password.clone())
    }

    fn set_credentials(&self, email: &str, password: &str) -> HostResult<()> {
        if self.fail_writes.lock().map(|f| *f).unwrap_or(false) {
            return Err(HostError::CredentialStore("Mock write failure".into()));
        }
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| HostError::CredentialStore("poisoned".into()))?;
        *inner = Some((email.to_string(), password.to_string()));
        Ok(())
    }

    fn clear_credentials(&self) -> HostResult<()> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| HostError::CredentialStore("poisoned".into()))?;
        *inner = None;
        Ok(())
    }
}

/// Event source that replays a fixed script of signals
pub struct ScriptedEventSource {
    script: Vec<Signal>,
    gap: Duration,
    fail_registration: bool,
}

impl ScriptedEventSource {
    pub fn new(script: Vec<Signal>) -> Self {
        Self {
            script,
            gap: Duration::ZERO,
            fail_registration: false,
        }
    }

    /// Pause between signals
    pub fn with_gap(mut self, gap: Duration) -> Self {
        self.gap = gap;
        self
    }

    /// Make `run` fail as if the OS refused the registration
    pub fn failing() -> Self {
        Self {
            script: Vec::new(),
            gap: Duration::ZERO,
            fail_registration: true,
        }
    }
}

#[async_trait]
impl EventSource for ScriptedEventSource {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn run(&self, tx: SignalSender) -> HostResult<()> {
        if self.fail_registration {
            return Err(HostError::RegistrationFailed("Mock registration failure".into()));
        }

        for signal in &self.script {
            if !self.gap.is_zero() {
                tokio::time::sleep(self.gap).await;
            }
            if tx.send(*signal).is_err() {
                break;
            }
        }
        Ok(())
    }
}

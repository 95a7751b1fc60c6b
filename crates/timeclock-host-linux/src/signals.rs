//! Unix signal event source
//!
//! Sleep hooks (systemd-sleep, pm-utils, a login manager script) notify the
//! daemon by signal: SIGUSR1 before suspend, SIGUSR2 after resume.

use async_trait::async_trait;
use timeclock_api::Signal;
use timeclock_host_api::{EventSource, HostError, HostResult, SignalSender};
use tokio::signal::unix::{SignalKind, signal};
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct UnixSignalSource;

impl UnixSignalSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventSource for UnixSignalSource {
    fn name(&self) -> &'static str {
        "unix-signals"
    }

    async fn run(&self, tx: SignalSender) -> HostResult<()> {
        let mut sleep = signal(SignalKind::user_defined1())
            .map_err(|e| HostError::RegistrationFailed(format!("SIGUSR1: {}", e)))?;
        let mut wake = signal(SignalKind::user_defined2())
            .map_err(|e| HostError::RegistrationFailed(format!("SIGUSR2: {}", e)))?;

        info!("Listening for SIGUSR1 (sleep) and SIGUSR2 (wake)");

        loop {
            let signal = tokio::select! {
                Some(()) = sleep.recv() => Signal::Sleep,
                Some(()) = wake.recv() => Signal::Wake,
                else => break,
            };

            debug!(%signal, "Unix signal received");
            if tx.send(signal).is_err() {
                debug!("Signal queue closed");
                break;
            }
        }
        Ok(())
    }
}

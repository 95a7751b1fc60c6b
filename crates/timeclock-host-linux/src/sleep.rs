//! Sleep/wake signals from systemd-logind
//!
//! logind broadcasts `PrepareForSleep(true)` before suspending and
//! `PrepareForSleep(false)` after resuming. While awake the source holds a
//! delay inhibitor, so suspend waits (up to logind's `InhibitDelayMaxSec`)
//! until the lock is released after the Sleep signal has been queued.

use async_trait::async_trait;
use futures::StreamExt;
use std::time::Duration;
use timeclock_api::Signal;
use timeclock_host_api::{EventSource, HostError, HostResult, SignalSender};
use tracing::{debug, info, warn};
use zbus::zvariant::OwnedFd;
use zbus::{Connection, Proxy};

const LOGIND_DESTINATION: &str = "org.freedesktop.login1";
const LOGIND_PATH: &str = "/org/freedesktop/login1";
const LOGIND_MANAGER: &str = "org.freedesktop.login1.Manager";

const INHIBIT_WHAT: &str = "sleep";
const INHIBIT_WHO: &str = "timeclockd";
const INHIBIT_WHY: &str = "Clock out before suspend";
const INHIBIT_MODE: &str = "delay";

/// Signal for a `PrepareForSleep` argument
pub fn sleep_transition(entering_sleep: bool) -> Signal {
    if entering_sleep {
        Signal::Sleep
    } else {
        Signal::Wake
    }
}

fn registration_failed(what: &str, e: zbus::Error) -> HostError {
    HostError::RegistrationFailed(format!("logind {}: {}", what, e))
}

/// Emits [`Signal::Sleep`] before suspend and [`Signal::Wake`] after resume
#[derive(Debug, Clone)]
pub struct LogindSleepSource {
    grace: Duration,
}

impl LogindSleepSource {
    /// `grace` is how long the inhibitor is kept after Sleep is queued,
    /// which bounds the time left for the clock-out request.
    pub fn new(grace: Duration) -> Self {
        Self { grace }
    }

    async fn inhibit(proxy: &Proxy<'_>) -> Option<OwnedFd> {
        match proxy
            .call::<_, _, OwnedFd>(
                "Inhibit",
                &(INHIBIT_WHAT, INHIBIT_WHO, INHIBIT_WHY, INHIBIT_MODE),
            )
            .await
        {
            Ok(fd) => {
                debug!("Sleep delay inhibitor taken");
                Some(fd)
            }
            Err(e) => {
                warn!(error = %e, "Could not take sleep inhibitor, suspend will not wait for clock-out");
                None
            }
        }
    }
}

#[async_trait]
impl EventSource for LogindSleepSource {
    fn name(&self) -> &'static str {
        "logind-sleep"
    }

    async fn run(&self, tx: SignalSender) -> HostResult<()> {
        let connection = Connection::system()
            .await
            .map_err(|e| registration_failed("system bus", e))?;

        let proxy = Proxy::new(&connection, LOGIND_DESTINATION, LOGIND_PATH, LOGIND_MANAGER)
            .await
            .map_err(|e| registration_failed("proxy", e))?;

        let mut transitions = proxy
            .receive_signal("PrepareForSleep")
            .await
            .map_err(|e| registration_failed("PrepareForSleep subscription", e))?;

        let mut lock = Self::inhibit(&proxy).await;
        info!(grace_secs = self.grace.as_secs(), "logind sleep source started");

        while let Some(message) = transitions.next().await {
            let entering_sleep: bool = match message.body().deserialize() {
                Ok(flag) => flag,
                Err(e) => {
                    warn!(error = %e, "Malformed PrepareForSleep signal");
                    continue;
                }
            };

            let signal = sleep_transition(entering_sleep);
            info!(%signal, "logind sleep transition");
            if tx.send(signal).is_err() {
                debug!("Signal queue closed, stopping logind sleep source");
                break;
            }

            if entering_sleep {
                if let Some(fd) = lock.take() {
                    let grace = self.grace;
                    tokio::spawn(async move {
                        tokio::time::sleep(grace).await;
                        drop(fd);
                        debug!("Sleep delay inhibitor released");
                    });
                }
            } else if lock.is_none() {
                lock = Self::inhibit(&proxy).await;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_for_sleep_maps_to_lifecycle_signals() {
        assert_eq!(sleep_transition(true), Signal::Sleep);
        assert_eq!(sleep_transition(false), Signal::Wake);
    }

    #[test]
    fn source_name() {
        assert_eq!(LogindSleepSource::new(Duration::from_secs(3)).name(), "logind-sleep");
    }
}

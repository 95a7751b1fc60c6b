//! Startup login trigger
//!
//! The daemon is started by the user session, so daemon start stands in for
//! user login. One `Login` is emitted after a short delay.

use async_trait::async_trait;
use std::time::Duration;
use timeclock_api::Signal;
use timeclock_host_api::{EventSource, HostResult, SignalSender};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct LoginTrigger {
    delay: Duration,
}

impl LoginTrigger {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl EventSource for LoginTrigger {
    fn name(&self) -> &'static str {
        "login-trigger"
    }

    async fn run(&self, tx: SignalSender) -> HostResult<()> {
        tokio::time::sleep(self.delay).await;
        info!("Session start, emitting login signal");
        if tx.send(Signal::Login).is_err() {
            debug!("Signal queue closed before login signal");
        }
        Ok(())
    }
}

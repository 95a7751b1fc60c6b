//! Suspend/resume detection by clock drift
//!
//! CLOCK_BOOTTIME keeps counting while the machine is suspended and
//! CLOCK_MONOTONIC does not. Sampling both at a fixed interval, a jump in
//! their difference means the system slept in between.

use async_trait::async_trait;
use nix::time::{ClockId, clock_gettime};
use std::time::Duration;
use timeclock_api::Signal;
use timeclock_host_api::{EventSource, HostError, HostResult, SignalSender};
use tracing::{debug, info};

/// Suspensions shorter than this are treated as scheduler noise
pub const MIN_SUSPEND: Duration = Duration::from_secs(2);

/// One reading of both clocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockSample {
    pub boottime: Duration,
    pub monotonic: Duration,
}

impl ClockSample {
    pub fn read() -> HostResult<Self> {
        Ok(Self {
            boottime: read_clock(ClockId::CLOCK_BOOTTIME)?,
            monotonic: read_clock(ClockId::CLOCK_MONOTONIC)?,
        })
    }

    fn suspended(&self) -> Duration {
        self.boottime.saturating_sub(self.monotonic)
    }
}

fn read_clock(id: ClockId) -> HostResult<Duration> {
    let ts = clock_gettime(id)
        .map_err(|e| HostError::RegistrationFailed(format!("clock_gettime({:?}): {}", id, e)))?;
    Ok(Duration::new(ts.tv_sec() as u64, ts.tv_nsec() as u32))
}

/// Time spent suspended between two samples, if it exceeds [`MIN_SUSPEND`]
pub fn suspended_between(before: ClockSample, after: ClockSample) -> Option<Duration> {
    let slept = after.suspended().saturating_sub(before.suspended());
    (slept >= MIN_SUSPEND).then_some(slept)
}

/// Emits [`Signal::Wake`] after the system resumes from suspend
#[derive(Debug, Clone)]
pub struct ResumeDetector {
    poll: Duration,
}

impl ResumeDetector {
    pub fn new(poll: Duration) -> Self {
        Self { poll }
    }
}

#[async_trait]
impl EventSource for ResumeDetector {
    fn name(&self) -> &'static str {
        "resume-detector"
    }

    async fn run(&self, tx: SignalSender) -> HostResult<()> {
        let mut last = ClockSample::read()?;
        let mut interval = tokio::time::interval(self.poll);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        info!(poll_secs = self.poll.as_secs(), "Resume detector started");

        loop {
            interval.tick().await;
            if tx.is_closed() {
                break;
            }

            let sample = ClockSample::read()?;
            if let Some(slept) = suspended_between(last, sample) {
                info!(slept_secs = slept.as_secs(), "Resume from suspend detected");
                if tx.send(Signal::Wake).is_err() {
                    break;
                }
            }
            last = sample;
        }

        debug!("Resume detector stopped");
        Ok(())
    }
}

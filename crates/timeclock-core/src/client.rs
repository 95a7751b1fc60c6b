//! Attendance client: session plus resolved context
//!
//! [`AttendanceApi`] is the seam the reconciler and status projector work
//! against. [`AttendanceClient`] is the HTTP implementation; tests use
//! [`crate::MockAttendanceApi`].

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Local};
use timeclock_api::{Context, Eligibility, ShiftRecord, ShiftSnapshot, YearMonth};
use timeclock_util::{Result, TimeclockError, WallClock, attendance_timestamp};
use tracing::info;

use crate::session::{SessionClient, SessionConfig};
use crate::{calendar, context};

const SHIFTS_PATH: &str = "/attendance/shifts";
const CLOCK_IN_PATH: &str = "/api/2025-10-01/resources/attendance/shifts/clock_in";
const CLOCK_OUT_PATH: &str = "/api/2025-10-01/resources/attendance/shifts/clock_out";

/// Snapshot for `day`. A day can hold several shifts once a break was
/// clocked; an open one wins, otherwise the latest.
pub fn today_shift(shifts: &[ShiftRecord], day: u32) -> ShiftSnapshot {
    let mut todays = shifts.iter().filter(|s| s.day == day);
    let latest = todays.clone().last();
    todays
        .find(|s| s.clock_out.is_none())
        .or(latest)
        .map(ShiftSnapshot::from_record)
        .unwrap_or_else(ShiftSnapshot::none)
}

/// Operations the reconciler needs from the HR service
#[async_trait]
pub trait AttendanceApi: Send {
    /// Sign in and resolve the context for the month of `now`.
    async fn login(&mut self, email: &str, password: &str, now: DateTime<Local>)
    -> Result<Context>;

    /// Authenticated and holding a context
    fn is_logged_in(&self) -> bool;

    fn context(&self) -> Option<Context>;

    async fn should_work_today(&mut self, now: DateTime<Local>) -> Result<Eligibility>;

    /// Today's shift, read fresh from the service
    async fn get_today_status(&mut self, now: DateTime<Local>) -> Result<ShiftSnapshot>;

    /// `Ok(false)` when the service declined the write
    async fn clock_in_now(&mut self, at: Option<WallClock>, now: DateTime<Local>)
    -> Result<bool>;

    async fn clock_out_now(
        &mut self,
        at: Option<WallClock>,
        now: DateTime<Local>,
    ) -> Result<bool>;
}

/// HTTP implementation of [`AttendanceApi`]
pub struct AttendanceClient {
    session: SessionClient,
    context: Option<Context>,
}

impl AttendanceClient {
    pub fn new(config: SessionConfig) -> Result<Self> {
        Ok(Self {
            session: SessionClient::new(config)?,
            context: None,
        })
    }

    /// Context valid for `now`, re-resolved when the month has rolled over.
    async fn current_context(&mut self, now: &DateTime<Local>) -> Result<Context> {
        self.session.ensure_logged_in()?;

        let ctx = self
            .context
            .ok_or_else(|| TimeclockError::auth("Not logged in. Call login() first."))?;
        if ctx.is_current(now) {
            return Ok(ctx);
        }

        info!(
            from = %ctx.resolved_at,
            to = %YearMonth::of(now),
            "Month rolled over, re-resolving context"
        );
        let fresh = context::resolve(&self.session, now).await?;
        self.context = Some(fresh);
        Ok(fresh)
    }

    async fn write(
        &mut self,
        path: &str,
        label: &str,
        at: Option<WallClock>,
        now: DateTime<Local>,
    ) -> Result<bool> {
        self.current_context(&now).await?;

        let at = at.unwrap_or_else(|| WallClock::of(&now));
        let stamp = attendance_timestamp(now.date_naive(), at);

        info!(action = label, at = %at, "Posting attendance");
        let status = self.session.post_attendance(path, &[("now", stamp)]).await?;
        if status.is_accepted() {
            info!(action = label, at = %at, "Attendance recorded");
        }
        Ok(status.is_accepted())
    }
}

#[async_trait]
impl AttendanceApi for AttendanceClient {
    async fn login(
        &mut self,
        email: &str,
        password: &str,
        now: DateTime<Local>,
    ) -> Result<Context> {
        self.context = None;
        if self.session.is_authenticated() {
            self.session.invalidate()?;
        }

        self.session.login(email, password).await?;
        let ctx = context::resolve(&self.session, &now).await?;
        self.context = Some(ctx);
        Ok(ctx)
    }

    fn is_logged_in(&self) -> bool {
        self.session.is_authenticated() && self.context.is_some()
    }

    fn context(&self) -> Option<Context> {
        self.context
    }

    async fn should_work_today(&mut self, now: DateTime<Local>) -> Result<Eligibility> {
        let ctx = self.current_context(&now).await?;
        calendar::should_work_today(&self.session, &ctx, &now).await
    }

    async fn get_today_status(&mut self, now: DateTime<Local>) -> Result<ShiftSnapshot> {
        let ctx = self.current_context(&now).await?;
        let month = YearMonth::of(&now);

        let shifts: Vec<ShiftRecord> = self
            .session
            .get_json(
                SHIFTS_PATH,
                &[
                    ("employee_id", ctx.employee_id.to_string()),
                    ("year", month.year.to_string()),
                    ("month", month.month.to_string()),
                ],
            )
            .await?;

        Ok(today_shift(&shifts, now.day()))
    }

    async fn clock_in_now(
        &mut self,
        at: Option<WallClock>,
        now: DateTime<Local>,
    ) -> Result<bool> {
        self.write(CLOCK_IN_PATH, "clock_in", at, now).await
    }

    async fn clock_out_now(
        &mut self,
        at: Option<WallClock>,
        now: DateTime<Local>,
    ) -> Result<bool> {
        self.write(CLOCK_OUT_PATH, "clock_out", at, now).await
    }
}

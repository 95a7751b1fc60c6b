//! Scriptable in-memory [`AttendanceApi`] for testing

use async_trait::async_trait;
use chrono::{DateTime, Local};
use timeclock_api::{Context, Eligibility, ShiftSnapshot, YearMonth};
use timeclock_util::{EmployeeId, PeriodId, Result, TimeclockError, WallClock};

use crate::AttendanceApi;

/// In-memory service state.
///
/// Writes mutate the shift the way the real service does: clock-in opens a
/// shift, clock-out closes it. Every call is counted.
#[derive(Debug, Clone)]
pub struct MockAttendanceApi {
    pub logged_in: bool,
    pub eligibility: Eligibility,
    pub shift: ShiftSnapshot,

    /// Answer writes with a business rejection
    pub reject_writes: bool,
    /// Fail reads with an API error
    pub fail_reads: bool,
    /// Fail login with this auth message
    pub login_error: Option<String>,

    pub login_calls: usize,
    pub eligibility_calls: usize,
    pub status_calls: usize,
    pub clock_in_calls: usize,
    pub clock_out_calls: usize,
}

impl Default for MockAttendanceApi {
    fn default() -> Self {
        Self {
            logged_in: false,
            eligibility: Eligibility::working("Working day"),
            shift: ShiftSnapshot::none(),
            reject_writes: false,
            fail_reads: false,
            login_error: None,
            login_calls: 0,
            eligibility_calls: 0,
            status_calls: 0,
            clock_in_calls: 0,
            clock_out_calls: 0,
        }
    }
}

impl MockAttendanceApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Already signed in, on a working day with no shift
    pub fn logged_in() -> Self {
        Self {
            logged_in: true,
            ..Self::default()
        }
    }

    pub fn with_eligibility(mut self, eligibility: Eligibility) -> Self {
        self.eligibility = eligibility;
        self
    }

    pub fn with_open_shift(mut self, clock_in: &str) -> Self {
        self.shift = ShiftSnapshot {
            has_shift: true,
            clock_in: Some(clock_in.to_string()),
            clock_out: None,
        };
        self
    }

    pub fn with_closed_shift(mut self, clock_in: &str, clock_out: &str) -> Self {
        self.shift = ShiftSnapshot {
            has_shift: true,
            clock_in: Some(clock_in.to_string()),
            clock_out: Some(clock_out.to_string()),
        };
        self
    }

    pub fn write_calls(&self) -> usize {
        self.clock_in_calls + self.clock_out_calls
    }

    fn check_read(&self) -> Result<()> {
        if !self.logged_in {
            return Err(TimeclockError::auth("Not logged in. Call login() first."));
        }
        if self.fail_reads {
            return Err(TimeclockError::api("Mock read failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl AttendanceApi for MockAttendanceApi {
    async fn login(
        &mut self,
        _email: &str,
        _password: &str,
        now: DateTime<Local>,
    ) -> Result<Context> {
        self.login_calls += 1;
        if let Some(message) = &self.login_error {
            self.logged_in = false;
            return Err(TimeclockError::auth(format!("Login failed: {}", message)));
        }
        self.logged_in = true;
        Ok(Context {
            employee_id: EmployeeId::new(7),
            period_id: PeriodId::new(42),
            resolved_at: YearMonth::of(&now),
        })
    }

    fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    fn context(&self) -> Option<Context> {
        self.logged_in.then(|| Context {
            employee_id: EmployeeId::new(7),
            period_id: PeriodId::new(42),
            resolved_at: YearMonth::new(2025, 10),
        })
    }

    async fn should_work_today(&mut self, _now: DateTime<Local>) -> Result<Eligibility> {
        self.eligibility_calls += 1;
        self.check_read()?;
        Ok(self.eligibility.clone())
    }

    async fn get_today_status(&mut self, _now: DateTime<Local>) -> Result<ShiftSnapshot> {
        self.status_calls += 1;
        self.check_read()?;
        Ok(self.shift.clone())
    }

    async fn clock_in_now(
        &mut self,
        at: Option<WallClock>,
        now: DateTime<Local>,
    ) -> Result<bool> {
        self.clock_in_calls += 1;
        self.check_read()?;
        if self.reject_writes {
            return Ok(false);
        }
        let at = at.unwrap_or_else(|| WallClock::of(&now));
        self.shift = ShiftSnapshot {
            has_shift: true,
            clock_in: Some(at.to_string()),
            clock_out: None,
        };
        Ok(true)
    }

    async fn clock_out_now(
        &mut self,
        at: Option<WallClock>,
        now: DateTime<Local>,
    ) -> Result<bool> {
        self.clock_out_calls += 1;
        self.check_read()?;
        if self.reject_writes {
            return Ok(false);
        }
        let at = at.unwrap_or_else(|| WallClock::of(&now));
        self.shift.clock_out = Some(at.to_string());
        Ok(true)
    }
}

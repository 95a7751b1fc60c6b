//! Shared types for the timeclockd API

use chrono::{DateTime, Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use timeclock_util::{EmployeeId, PeriodId};

/// A calendar month, used to scope periods, calendars, and shift queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn of(dt: &DateTime<Local>) -> Self {
        Self {
            year: dt.year(),
            month: dt.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.year, self.month)
    }
}

/// Entry of `GET /attendance/periods`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    pub month: u32,
    pub id: PeriodId,
    pub employee_id: EmployeeId,
}

/// Entry of `GET /attendance/calendar`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub day: u32,
    #[serde(default)]
    pub is_leave: bool,
    #[serde(default)]
    pub leave_name: Option<String>,
    #[serde(default)]
    pub is_laborable: bool,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub date: Option<String>,
}

impl CalendarDay {
    /// Parse `date`. `Ok(None)` when the service left it out.
    pub fn parsed_date(&self) -> Result<Option<NaiveDate>, chrono::ParseError> {
        match self.date.as_deref() {
            None | Some("") => Ok(None),
            Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").map(Some),
        }
    }
}

/// Entry of `GET /attendance/shifts`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftRecord {
    pub day: u32,
    #[serde(default)]
    pub clock_in: Option<String>,
    #[serde(default)]
    pub clock_out: Option<String>,
}

/// Identifiers every attendance call is scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub employee_id: EmployeeId,
    pub period_id: PeriodId,
    pub resolved_at: YearMonth,
}

impl Context {
    /// Whether this context still applies at `now`.
    pub fn is_current(&self, now: &DateTime<Local>) -> bool {
        self.resolved_at == YearMonth::of(now)
    }
}

/// Whether today is a working day, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eligibility {
    pub eligible: bool,
    pub reason: String,
}

impl Eligibility {
    pub fn working(reason: impl Into<String>) -> Self {
        Self {
            eligible: true,
            reason: reason.into(),
        }
    }

    pub fn not_working(reason: impl Into<String>) -> Self {
        Self {
            eligible: false,
            reason: reason.into(),
        }
    }
}

/// Today's shift as last read from the service. Never cached across decisions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftSnapshot {
    pub has_shift: bool,
    pub clock_in: Option<String>,
    pub clock_out: Option<String>,
}

impl ShiftSnapshot {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_record(record: &ShiftRecord) -> Self {
        Self {
            has_shift: true,
            clock_in: record.clock_in.clone(),
            clock_out: record.clock_out.clone(),
        }
    }

    pub fn state(&self) -> DayState {
        match (self.has_shift, &self.clock_out) {
            (false, _) => DayState::NoShift,
            (true, None) => DayState::OpenShift {
                clock_in: self.clock_in.clone(),
            },
            (true, Some(out)) => DayState::ClosedShift {
                clock_in: self.clock_in.clone(),
                clock_out: out.clone(),
            },
        }
    }
}

/// Attendance state for today, derived from a [`ShiftSnapshot`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DayState {
    NoShift,
    OpenShift {
        clock_in: Option<String>,
    },
    ClosedShift {
        clock_in: Option<String>,
        clock_out: String,
    },
}

impl DayState {
    pub fn is_open(&self) -> bool {
        matches!(self, DayState::OpenShift { .. })
    }
}

/// OS lifecycle signal driving the reconciler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Login,
    Sleep,
    Wake,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Login => "login",
            Signal::Sleep => "sleep",
            Signal::Wake => "wake",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("Unknown signal '{0}' (expected login, sleep or wake)")]
pub struct UnknownSignal(String);

impl FromStr for Signal {
    type Err = UnknownSignal;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "login" => Ok(Signal::Login),
            "sleep" | "suspend" => Ok(Signal::Sleep),
            "wake" | "resume" => Ok(Signal::Wake),
            other => Err(UnknownSignal(other.to_string())),
        }
    }
}

/// Attendance write performed against the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceAction {
    ClockIn,
    ClockOut,
}

/// What the reconciler did in response to one signal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// Clock-in accepted by the service
    ClockedIn { at: String },
    /// Clock-out accepted by the service
    ClockedOut { at: String },
    /// The service answered but declined the write
    Rejected { action: AttendanceAction },
    /// Today is not a working day
    NotWorkingDay { reason: String },
    /// A shift is already open, nothing to do
    AlreadyClockedIn { since: Option<String> },
    /// No open shift to close
    NothingToClose,
    /// The client has no authenticated session
    NotConnected,
    /// A read or write failed; no action was taken
    Failed { message: String },
}

impl ReconcileOutcome {
    /// Whether the remote attendance record changed.
    pub fn changed_state(&self) -> bool {
        matches!(
            self,
            ReconcileOutcome::ClockedIn { .. } | ReconcileOutcome::ClockedOut { .. }
        )
    }
}

/// Icon hint for presentation layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusIcon {
    #[default]
    Default,
    NonWorkingDay,
    Completed,
    Overtime,
    Warning,
    Error,
}

impl StatusIcon {
    pub fn glyph(&self) -> &'static str {
        match self {
            StatusIcon::Default => "⏰",
            StatusIcon::NonWorkingDay => "🏖️",
            StatusIcon::Completed => "✅",
            StatusIcon::Overtime => "💪",
            StatusIcon::Warning => "⚠️",
            StatusIcon::Error => "❌",
        }
    }
}

/// Text shown by a tray icon or status bar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusProjection {
    pub displayable_text: String,
    pub tooltip_text: String,
    pub icon: StatusIcon,
}

impl StatusProjection {
    pub fn new(
        displayable_text: impl Into<String>,
        tooltip_text: impl Into<String>,
        icon: StatusIcon,
    ) -> Self {
        Self {
            displayable_text: displayable_text.into(),
            tooltip_text: tooltip_text.into(),
            icon,
        }
    }

    pub fn initializing() -> Self {
        Self::new("Status: Initializing...", "Initializing...", StatusIcon::Default)
    }
}

/// Snapshot of the daemon state, returned by `GetState`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonStateSnapshot {
    pub api_version: u32,
    pub logged_in: bool,
    pub email: Option<String>,
    pub context: Option<Context>,
    pub status: StatusProjection,
    pub last_outcome: Option<ReconcileOutcome>,
    pub last_refresh: Option<DateTime<Local>>,
}

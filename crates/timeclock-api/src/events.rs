//! Event types for timeclockd -> client streaming

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use timeclock_util::{EmployeeId, PeriodId};

use crate::{ReconcileOutcome, Signal, StatusProjection, API_VERSION};

/// Event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub api_version: u32,
    pub timestamp: DateTime<Local>,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(payload: EventPayload) -> Self {
        Self {
            api_version: API_VERSION,
            timestamp: timeclock_util::now(),
            payload,
        }
    }
}

/// All possible events from the daemon to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// Status projection was recomputed
    StatusChanged(StatusProjection),

    /// The reconciler handled a signal
    SignalHandled {
        signal: Signal,
        outcome: ReconcileOutcome,
    },

    /// Signed in and resolved the attendance context
    LoggedIn {
        employee_id: EmployeeId,
        period_id: PeriodId,
    },

    /// Sign-in failed
    LoginFailed { message: String },

    /// Daemon is shutting down
    Shutdown,
}

//! Core events emitted by the engine

use timeclock_api::{
    AttendanceAction, Context, EventPayload, ReconcileOutcome, Signal, StatusProjection,
};

/// Events emitted by the attendance engine
#[derive(Debug, Clone, PartialEq)]
pub enum CoreEvent {
    /// Signed in and resolved the context
    LoggedIn { context: Context },

    LoginFailed { message: String },

    /// Clock-in accepted
    ClockedIn { signal: Signal, at: String },

    /// Clock-out accepted
    ClockedOut { signal: Signal, at: String },

    /// The service declined a write
    ActionRejected {
        signal: Signal,
        action: AttendanceAction,
    },

    /// Not a working day
    Skipped { signal: Signal, reason: String },

    /// No authenticated session
    NotConnected { signal: Signal },

    AlreadyClockedIn {
        signal: Signal,
        since: Option<String>,
    },

    NothingToClose { signal: Signal },

    /// A read or write failed while handling a signal
    HandlerFailed { signal: Signal, message: String },

    /// The cached status projection changed
    StatusChanged(StatusProjection),
}

impl CoreEvent {
    pub fn from_outcome(signal: Signal, outcome: &ReconcileOutcome) -> Self {
        match outcome {
            ReconcileOutcome::ClockedIn { at } => CoreEvent::ClockedIn {
                signal,
                at: at.clone(),
            },
            ReconcileOutcome::ClockedOut { at } => CoreEvent::ClockedOut {
                signal,
                at: at.clone(),
            },
            ReconcileOutcome::Rejected { action } => CoreEvent::ActionRejected {
                signal,
                action: *action,
            },
            ReconcileOutcome::NotWorkingDay { reason } => CoreEvent::Skipped {
                signal,
                reason: reason.clone(),
            },
            ReconcileOutcome::NotConnected => CoreEvent::NotConnected { signal },
            ReconcileOutcome::AlreadyClockedIn { since } => CoreEvent::AlreadyClockedIn {
                signal,
                since: since.clone(),
            },
            ReconcileOutcome::NothingToClose => CoreEvent::NothingToClose { signal },
            ReconcileOutcome::Failed { message } => CoreEvent::HandlerFailed {
                signal,
                message: message.clone(),
            },
        }
    }

    /// IPC payload for broadcasting to subscribers
    pub fn to_payload(&self) -> EventPayload {
        let handled = |signal: &Signal, outcome| EventPayload::SignalHandled {
            signal: *signal,
            outcome,
        };

        match self {
            CoreEvent::LoggedIn { context } => EventPayload::LoggedIn {
                employee_id: context.employee_id,
                period_id: context.period_id,
            },
            CoreEvent::LoginFailed { message } => EventPayload::LoginFailed {
                message: message.clone(),
            },
            CoreEvent::StatusChanged(status) => EventPayload::StatusChanged(status.clone()),
            CoreEvent::ClockedIn { signal, at } => {
                handled(signal, ReconcileOutcome::ClockedIn { at: at.clone() })
            }
            CoreEvent::ClockedOut { signal, at } => {
                handled(signal, ReconcileOutcome::ClockedOut { at: at.clone() })
            }
            CoreEvent::ActionRejected { signal, action } => {
                handled(signal, ReconcileOutcome::Rejected { action: *action })
            }
            CoreEvent::Skipped { signal, reason } => handled(
                signal,
                ReconcileOutcome::NotWorkingDay {
                    reason: reason.clone(),
                },
            ),
            CoreEvent::NotConnected { signal } => handled(signal, ReconcileOutcome::NotConnected),
            CoreEvent::AlreadyClockedIn { signal, since } => handled(
                signal,
                ReconcileOutcome::AlreadyClockedIn {
                    since: since.clone(),
                },
            ),
            CoreEvent::NothingToClose { signal } => {
                handled(signal, ReconcileOutcome::NothingToClose)
            }
            CoreEvent::HandlerFailed { signal, message } => handled(
                signal,
                ReconcileOutcome::Failed {
                    message: message.clone(),
                },
            ),
        }
    }

    /// Reconciler outcome this event reports, if any
    pub fn outcome(&self) -> Option<(Signal, ReconcileOutcome)> {
        match self.to_payload() {
            EventPayload::SignalHandled { signal, outcome } => Some((signal, outcome)),
            _ => None,
        }
    }
}

//! Attendance reconciler
//!
//! Maps one lifecycle [`Signal`] to at most one attendance write. Eligibility
//! and today's shift are read fresh for every signal, so repeated or
//! out-of-order signals never open a second shift or close a missing one.

use chrono::{DateTime, Local};
use timeclock_api::{AttendanceAction, DayState, ReconcileOutcome, Signal};
use timeclock_util::{Result, WallClock};
use tracing::{error, info, warn};

use crate::AttendanceApi;

/// What to do given today's shift state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    ClockIn,
    ClockOut,
    Skip(ReconcileOutcome),
}

/// Login or Wake on an eligible day
pub fn decide_arrival(state: &DayState) -> Decision {
    match state {
        DayState::OpenShift { clock_in } => Decision::Skip(ReconcileOutcome::AlreadyClockedIn {
            since: clock_in.clone(),
        }),
        DayState::NoShift | DayState::ClosedShift { .. } => Decision::ClockIn,
    }
}

/// Sleep, regardless of eligibility
pub fn decide_departure(state: &DayState) -> Decision {
    if state.is_open() {
        Decision::ClockOut
    } else {
        Decision::Skip(ReconcileOutcome::NothingToClose)
    }
}

/// Handle one signal. Errors are logged and reported as `Failed`.
pub async fn reconcile<A>(api: &mut A, signal: Signal, now: DateTime<Local>) -> ReconcileOutcome
where
    A: AttendanceApi + ?Sized,
{
    if !api.is_logged_in() {
        warn!(%signal, "Not connected, ignoring signal");
        return ReconcileOutcome::NotConnected;
    }

    let result = match signal {
        Signal::Login | Signal::Wake => arrive(api, now).await,
        Signal::Sleep => depart(api, now).await,
    };

    match result {
        Ok(outcome) => {
            info!(%signal, ?outcome, "Signal handled");
            outcome
        }
        Err(e) => {
            error!(%signal, error = %e, "Signal handler failed");
            ReconcileOutcome::Failed {
                message: e.to_string(),
            }
        }
    }
}

async fn arrive<A>(api: &mut A, now: DateTime<Local>) -> Result<ReconcileOutcome>
where
    A: AttendanceApi + ?Sized,
{
    let eligibility = api.should_work_today(now).await?;
    if !eligibility.eligible {
        info!(reason = %eligibility.reason, "Not a working day, skipping clock-in");
        return Ok(ReconcileOutcome::NotWorkingDay {
            reason: eligibility.reason,
        });
    }

    let snapshot = api.get_today_status(now).await?;
    if let Decision::Skip(outcome) = decide_arrival(&snapshot.state()) {
        return Ok(outcome);
    }

    let at = WallClock::of(&now);
    if api.clock_in_now(Some(at), now).await? {
        Ok(ReconcileOutcome::ClockedIn { at: at.to_string() })
    } else {
        Ok(ReconcileOutcome::Rejected {
            action: AttendanceAction::ClockIn,
        })
    }
}

async fn depart<A>(api: &mut A, now: DateTime<Local>) -> Result<ReconcileOutcome>
where
    A: AttendanceApi + ?Sized,
{
    let snapshot = api.get_today_status(now).await?;
    if let Decision::Skip(outcome) = decide_departure(&snapshot.state()) {
        return Ok(outcome);
    }

    let at = WallClock::of(&now);
    if api.clock_out_now(Some(at), now).await? {
        Ok(ReconcileOutcome::ClockedOut { at: at.to_string() })
    } else {
        Ok(ReconcileOutcome::Rejected {
            action: AttendanceAction::ClockOut,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockAttendanceApi;
    use chrono::TimeZone;
    use timeclock_api::Eligibility;

    fn at(hour: u32, minute: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 10, 15, hour, minute, 0).unwrap()
    }

    #[test]
    fn arrival_decisions() {
        assert_eq!(decide_arrival(&DayState::NoShift), Decision::ClockIn);
        assert_eq!(
            decide_arrival(&DayState::ClosedShift {
                clock_in: Some("09:00".into()),
                clock_out: "13:00".into()
            }),
            Decision::ClockIn
        );
        assert_eq!(
            decide_arrival(&DayState::OpenShift {
                clock_in: Some("09:00".into())
            }),
            Decision::Skip(ReconcileOutcome::AlreadyClockedIn {
                since: Some("09:00".into())
            })
        );
    }

    #[test]
    fn departure_decisions() {
        assert_eq!(
            decide_departure(&DayState::OpenShift { clock_in: None }),
            Decision::ClockOut
        );
        assert_eq!(
            decide_departure(&DayState::NoShift),
            Decision::Skip(ReconcileOutcome::NothingToClose)
        );
    }

    #[tokio::test]
    async fn login_clocks_in_on_working_day() {
        let mut api = MockAttendanceApi::logged_in();
        let outcome = reconcile(&mut api, Signal::Login, at(9, 5)).await;
        assert_eq!(outcome, ReconcileOutcome::ClockedIn { at: "09:05".into() });
        assert_eq!(api.clock_in_calls, 1);
    }

    #[tokio::test]
    async fn login_and_wake_sequences_clock_in_at_most_once() {
        let sequences = [
            vec![Signal::Login, Signal::Login],
            vec![Signal::Login, Signal::Wake],
            vec![Signal::Wake, Signal::Login, Signal::Wake],
            vec![Signal::Wake, Signal::Wake, Signal::Wake, Signal::Wake],
        ];

        for sequence in sequences {
            let mut api = MockAttendanceApi::logged_in();
            for (i, signal) in sequence.iter().enumerate() {
                reconcile(&mut api, *signal, at(9, i as u32)).await;
            }
            assert_eq!(api.clock_in_calls, 1, "sequence {:?}", sequence);
            assert_eq!(api.clock_out_calls, 0);
        }
    }

    #[tokio::test]
    async fn sleep_without_open_shift_never_clocks_out() {
        for mut api in [
            MockAttendanceApi::logged_in(),
            MockAttendanceApi::logged_in().with_closed_shift("09:00", "17:00"),
        ] {
            for _ in 0..3 {
                let outcome = reconcile(&mut api, Signal::Sleep, at(18, 0)).await;
                assert_eq!(outcome, ReconcileOutcome::NothingToClose);
            }
            assert_eq!(api.clock_out_calls, 0);
        }
    }

    #[tokio::test]
    async fn sleep_closes_open_shift_once() {
        let mut api = MockAttendanceApi::logged_in().with_open_shift("09:00");
        let first = reconcile(&mut api, Signal::Sleep, at(13, 0)).await;
        let second = reconcile(&mut api, Signal::Sleep, at(13, 1)).await;

        assert_eq!(first, ReconcileOutcome::ClockedOut { at: "13:00".into() });
        assert_eq!(second, ReconcileOutcome::NothingToClose);
        assert_eq!(api.clock_out_calls, 1);
    }

    #[tokio::test]
    async fn sleep_then_wake_opens_new_shift() {
        let mut api = MockAttendanceApi::logged_in().with_open_shift("09:00");
        reconcile(&mut api, Signal::Sleep, at(13, 0)).await;
        let outcome = reconcile(&mut api, Signal::Wake, at(14, 0)).await;

        assert_eq!(outcome, ReconcileOutcome::ClockedIn { at: "14:00".into() });
        assert_eq!(api.clock_in_calls, 1);
        assert_eq!(api.clock_out_calls, 1);
    }

    #[tokio::test]
    async fn non_working_day_skips_shift_read() {
        let mut api = MockAttendanceApi::logged_in()
            .with_eligibility(Eligibility::not_working("Leave day: Vacation"));
        let outcome = reconcile(&mut api, Signal::Wake, at(9, 0)).await;

        assert_eq!(
            outcome,
            ReconcileOutcome::NotWorkingDay {
                reason: "Leave day: Vacation".into()
            }
        );
        assert_eq!(api.status_calls, 0);
        assert_eq!(api.write_calls(), 0);
    }

    #[tokio::test]
    async fn sleep_closes_shift_on_non_working_day() {
        let mut api = MockAttendanceApi::logged_in()
            .with_eligibility(Eligibility::not_working("Non-working day: Saturday"))
            .with_open_shift("10:00");
        let outcome = reconcile(&mut api, Signal::Sleep, at(12, 0)).await;
        assert!(matches!(outcome, ReconcileOutcome::ClockedOut { .. }));
    }

    #[tokio::test]
    async fn not_connected_makes_no_calls() {
        let mut api = MockAttendanceApi::new();
        for signal in [Signal::Login, Signal::Sleep, Signal::Wake] {
            assert_eq!(
                reconcile(&mut api, signal, at(9, 0)).await,
                ReconcileOutcome::NotConnected
            );
        }
        assert_eq!(api.eligibility_calls + api.status_calls + api.write_calls(), 0);
    }

    #[tokio::test]
    async fn read_failure_takes_no_action() {
        let mut api = MockAttendanceApi::logged_in();
        api.fail_reads = true;

        let outcome = reconcile(&mut api, Signal::Login, at(9, 0)).await;
        assert!(matches!(outcome, ReconcileOutcome::Failed { .. }));
        assert_eq!(api.write_calls(), 0);
    }

    #[tokio::test]
    async fn rejected_write_is_reported_not_retried() {
        let mut api = MockAttendanceApi::logged_in();
        api.reject_writes = true;

        let outcome = reconcile(&mut api, Signal::Login, at(9, 0)).await;
        assert_eq!(
            outcome,
            ReconcileOutcome::Rejected {
                action: AttendanceAction::ClockIn
            }
        );
        assert_eq!(api.clock_in_calls, 1);
    }
}

//! Working-day eligibility from the monthly calendar feed

use chrono::{DateTime, Datelike, Local};
use timeclock_api::{CalendarDay, Context, Eligibility, YearMonth};
use timeclock_util::{Result, TimeclockError};
use tracing::{debug, warn};

use crate::session::SessionClient;

const CALENDAR_PATH: &str = "/attendance/calendar";

/// Decide whether `now` is a working day.
///
/// Rules, first match wins: leave, non-laborable, laborable. A day missing
/// from the feed is assumed to be a working day.
pub fn evaluate_day(days: &[CalendarDay], now: &DateTime<Local>) -> Result<Eligibility> {
    let Some(today) = days.iter().find(|d| d.day == now.day()) else {
        warn!(day = now.day(), "Today not found in calendar, assuming working day");
        return Ok(Eligibility::working("Working day (assumed)"));
    };

    if today.is_leave {
        let name = today.leave_name.as_deref().unwrap_or("Leave");
        return Ok(Eligibility::not_working(format!("Leave day: {}", name)));
    }

    if !today.is_laborable {
        let date = today.parsed_date().map_err(|e| {
            TimeclockError::api(format!(
                "Malformed calendar date {:?}: {}",
                today.date.as_deref().unwrap_or_default(),
                e
            ))
        })?;
        return Ok(match date {
            Some(date) => {
                Eligibility::not_working(format!("Non-working day: {}", date.format("%A")))
            }
            None => Eligibility::not_working("Non-working day (weekend or holiday)"),
        });
    }

    Ok(Eligibility::working("Working day"))
}

/// Fetch this month's calendar for the context's employee and evaluate today.
pub async fn should_work_today(
    session: &SessionClient,
    context: &Context,
    now: &DateTime<Local>,
) -> Result<Eligibility> {
    let month = YearMonth::of(now);
    let days: Vec<CalendarDay> = session
        .get_json(
            CALENDAR_PATH,
            &[
                ("id", context.employee_id.to_string()),
                ("year", month.year.to_string()),
                ("month", month.month.to_string()),
            ],
        )
        .await?;

    let eligibility = evaluate_day(&days, now)?;
    debug!(eligible = eligibility.eligible, reason = %eligibility.reason, "Eligibility evaluated");
    Ok(eligibility)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn wednesday() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 10, 15, 9, 0, 0).unwrap()
    }

    fn day(day: u32) -> CalendarDay {
        CalendarDay {
            day,
            is_leave: false,
            leave_name: None,
            is_laborable: true,
            date: Some(format!("2025-10-{:02}", day)),
        }
    }

    #[test]
    fn laborable_day_is_working() {
        let e = evaluate_day(&[day(14), day(15)], &wednesday()).unwrap();
        assert_eq!(e, Eligibility::working("Working day"));
    }

    #[test]
    fn leave_wins_over_laborable_flag() {
        for laborable in [true, false] {
            let mut today = day(15);
            today.is_leave = true;
            today.leave_name = Some("Vacation".into());
            today.is_laborable = laborable;

            let e = evaluate_day(&[today], &wednesday()).unwrap();
            assert_eq!(e, Eligibility::not_working("Leave day: Vacation"));
        }
    }

    #[test]
    fn unnamed_leave() {
        let mut today = day(15);
        today.is_leave = true;
        let e = evaluate_day(&[today], &wednesday()).unwrap();
        assert_eq!(e.reason, "Leave day: Leave");
    }

    #[test]
    fn non_laborable_names_weekday() {
        let saturday = Local.with_ymd_and_hms(2025, 10, 18, 9, 0, 0).unwrap();
        let mut today = day(18);
        today.is_laborable = false;
        let e = evaluate_day(&[today], &saturday).unwrap();
        assert_eq!(e, Eligibility::not_working("Non-working day: Saturday"));
    }

    #[test]
    fn non_laborable_without_date() {
        let mut today = day(15);
        today.is_laborable = false;
        today.date = None;
        let e = evaluate_day(&[today], &wednesday()).unwrap();
        assert_eq!(
            e,
            Eligibility::not_working("Non-working day (weekend or holiday)")
        );
    }

    #[test]
    fn malformed_date_is_api_error() {
        let mut today = day(15);
        today.is_laborable = false;
        today.date = Some("15/10/2025".into());
        assert!(matches!(
            evaluate_day(&[today], &wednesday()),
            Err(TimeclockError::ApiError(_))
        ));
    }

    #[test]
    fn missing_day_is_assumed_working() {
        let e = evaluate_day(&[day(1), day(2)], &wednesday()).unwrap();
        assert_eq!(e, Eligibility::working("Working day (assumed)"));

        let e = evaluate_day(&[], &wednesday()).unwrap();
        assert!(e.eligible);
    }
}

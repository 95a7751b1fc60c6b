//! Status projection for presentation layers

use chrono::{DateTime, Local};
use timeclock_api::{DayState, StatusIcon, StatusProjection};
use timeclock_util::{
    Result, calculate_remaining_hours, format_remaining_time, format_time_display,
};
use tracing::error;

use crate::AttendanceApi;

/// Build the status line and tooltip for `now`.
///
/// Each call reads eligibility and today's shift afresh. Read failures
/// collapse into the error projection.
pub async fn project_status<A>(
    api: &mut A,
    workday_hours: u8,
    now: DateTime<Local>,
) -> StatusProjection
where
    A: AttendanceApi + ?Sized,
{
    if !api.is_logged_in() {
        return StatusProjection::new(
            "Status: Not connected",
            "Not connected",
            StatusIcon::Default,
        );
    }

    match read_status(api, workday_hours, now).await {
        Ok(projection) => projection,
        Err(e) => {
            error!(error = %e, "Error fetching status");
            error_projection()
        }
    }
}

pub fn error_projection() -> StatusProjection {
    StatusProjection::new(
        "Status: Error fetching data",
        "Error fetching data",
        StatusIcon::Error,
    )
}

async fn read_status<A>(
    api: &mut A,
    workday_hours: u8,
    now: DateTime<Local>,
) -> Result<StatusProjection>
where
    A: AttendanceApi + ?Sized,
{
    let eligibility = api.should_work_today(now).await?;
    if !eligibility.eligible {
        return Ok(StatusProjection::new(
            format!("Status: {}", eligibility.reason),
            eligibility.reason,
            StatusIcon::NonWorkingDay,
        ));
    }

    let snapshot = api.get_today_status(now).await?;
    let projection = match snapshot.state() {
        DayState::NoShift => StatusProjection::new(
            "Status: Not clocked in today",
            "Ready to clock in (not clocked in yet)",
            StatusIcon::Warning,
        ),
        DayState::ClosedShift {
            clock_in,
            clock_out,
        } => {
            let clock_in = clock_in.unwrap_or_else(|| "?".to_string());
            StatusProjection::new(
                format!("Status: Clocked: {} - {}", clock_in, clock_out),
                format!("Done for today: {} - {}", clock_in, clock_out),
                StatusIcon::Completed,
            )
        }
        DayState::OpenShift { clock_in: None } => {
            StatusProjection::new("Status: Clocked in", "Clocked in", StatusIcon::Default)
        }
        DayState::OpenShift {
            clock_in: Some(clock_in),
        } => open_shift(&clock_in, workday_hours, now)?,
    };
    Ok(projection)
}

fn open_shift(clock_in: &str, workday_hours: u8, now: DateTime<Local>) -> Result<StatusProjection> {
    let remaining = calculate_remaining_hours(clock_in, workday_hours, &now)?;

    if remaining > 0.0 {
        let (hours, minutes) = format_remaining_time(remaining);
        let left = format_time_display(hours, minutes);
        Ok(StatusProjection::new(
            format!("Status: Clocked in: {} ({} left)", clock_in, left),
            format!("{} remaining of {}h workday", left, workday_hours),
            StatusIcon::Default,
        ))
    } else {
        Ok(StatusProjection::new(
            format!("Status: Clocked in: {} (overtime!)", clock_in),
            format!("Working overtime since {}", clock_in),
            StatusIcon::Overtime,
        ))
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

    #[tokio::test]
    async fn not_connected() {
        let mut api = MockAttendanceApi::new();
        let p = project_status(&mut api, 8, at(9, 0)).await;
        assert_eq!(p.displayable_text, "Status: Not connected");
        assert_eq!(api.eligibility_calls, 0);
    }

    #[tokio::test]
    async fn non_working_day() {
        let mut api = MockAttendanceApi::logged_in()
            .with_eligibility(Eligibility::not_working("Leave day: Vacation"));
        let p = project_status(&mut api, 8, at(9, 0)).await;
        assert_eq!(p.displayable_text, "Status: Leave day: Vacation");
        assert_eq!(p.tooltip_text, "Leave day: Vacation");
        assert_eq!(p.icon, StatusIcon::NonWorkingDay);
    }

    #[tokio::test]
    async fn no_shift_yet() {
        let mut api = MockAttendanceApi::logged_in();
        let p = project_status(&mut api, 8, at(9, 0)).await;
        assert_eq!(p.displayable_text, "Status: Not clocked in today");
        assert_eq!(p.icon, StatusIcon::Warning);
    }

    #[tokio::test]
    async fn open_shift_shows_time_left() {
        let mut api = MockAttendanceApi::logged_in().with_open_shift("09:00");
        let p = project_status(&mut api, 8, at(10, 45)).await;
        assert_eq!(p.displayable_text, "Status: Clocked in: 09:00 (6h 15m left)");
        assert_eq!(p.tooltip_text, "6h 15m remaining of 8h workday");
    }

    #[tokio::test]
    async fn last_minutes_of_the_day() {
        let mut api = MockAttendanceApi::logged_in().with_open_shift("09:00");
        let p = project_status(&mut api, 8, at(16, 15)).await;
        assert_eq!(p.displayable_text, "Status: Clocked in: 09:00 (45m left)");
    }

    #[tokio::test]
    async fn overtime() {
        let mut api = MockAttendanceApi::logged_in().with_open_shift("09:00");
        for now in [at(17, 0), at(18, 30)] {
            let p = project_status(&mut api, 8, now).await;
            assert_eq!(p.displayable_text, "Status: Clocked in: 09:00 (overtime!)");
            assert_eq!(p.icon, StatusIcon::Overtime);
        }
    }

    #[tokio::test]
    async fn done_for_today() {
        let mut api = MockAttendanceApi::logged_in().with_closed_shift("09:00", "17:00");
        let p = project_status(&mut api, 8, at(18, 0)).await;
        assert_eq!(p.displayable_text, "Status: Clocked: 09:00 - 17:00");
        assert_eq!(p.tooltip_text, "Done for today: 09:00 - 17:00");
        assert_eq!(p.icon, StatusIcon::Completed);
    }

    #[tokio::test]
    async fn read_failure_projects_error() {
        let mut api = MockAttendanceApi::logged_in();
        api.fail_reads = true;
        let p = project_status(&mut api, 8, at(9, 0)).await;
        assert_eq!(p, error_projection());
    }

    #[tokio::test]
    async fn malformed_clock_in_projects_error() {
        let mut api = MockAttendanceApi::logged_in().with_open_shift("nine");
        let p = project_status(&mut api, 8, at(9, 0)).await;
        assert_eq!(p.icon, StatusIcon::Error);
    }
}

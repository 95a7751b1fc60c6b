//! Employee and pay-period resolution

use chrono::{DateTime, Local};
use timeclock_api::{Context, Period, YearMonth};
use timeclock_util::{Result, TimeclockError};
use tracing::info;

use crate::session::SessionClient;

const PERIODS_PATH: &str = "/attendance/periods";

/// Pick the period covering `now` out of the periods feed.
pub fn select_period(periods: &[Period], now: &DateTime<Local>) -> Result<Context> {
    let wanted = YearMonth::of(now);

    periods
        .iter()
        .find(|p| p.year == wanted.year && p.month == wanted.month)
        .map(|p| Context {
            employee_id: p.employee_id,
            period_id: p.id,
            resolved_at: wanted,
        })
        .ok_or_else(|| TimeclockError::api(format!("Could not find period for {}", wanted)))
}

/// Fetch the periods feed for the month of `now` and resolve the context.
pub async fn resolve(session: &SessionClient, now: &DateTime<Local>) -> Result<Context> {
    let month = YearMonth::of(now);
    info!(%month, "Fetching period data");

    let periods: Vec<Period> = session
        .get_json(
            PERIODS_PATH,
            &[
                ("year", month.year.to_string()),
                ("month", month.month.to_string()),
            ],
        )
        .await?;

    let context = select_period(&periods, now)?;
    info!(
        employee_id = %context.employee_id,
        period_id = %context.period_id,
        "Context resolved"
    );
    Ok(context)
}

//! Attendance engine
//!
//! Owns the [`AttendanceApi`] implementation and the cached status the
//! daemon hands out. All methods take `&mut self`; the daemon drives the
//! engine from a single task, so signals are handled strictly one at a time.

use chrono::{DateTime, Local};
use timeclock_api::{
    API_VERSION, Context, DaemonStateSnapshot, ReconcileOutcome, Signal, StatusProjection,
};
use timeclock_util::Result;
use tracing::{debug, info, warn};

use crate::{AttendanceApi, CoreEvent, project_status, reconcile};

pub struct AttendanceEngine<A> {
    api: A,
    workday_hours: u8,
    email: Option<String>,
    status: StatusProjection,
    last_outcome: Option<ReconcileOutcome>,
    last_refresh: Option<DateTime<Local>>,
}

impl<A: AttendanceApi> AttendanceEngine<A> {
    pub fn new(api: A, workday_hours: u8) -> Self {
        info!(workday_hours, "Attendance engine initialized");
        Self {
            api,
            workday_hours,
            email: None,
            status: StatusProjection::initializing(),
            last_outcome: None,
            last_refresh: None,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn api_mut(&mut self) -> &mut A {
        &mut self.api
    }

    pub fn is_logged_in(&self) -> bool {
        self.api.is_logged_in()
    }

    pub fn status(&self) -> &StatusProjection {
        &self.status
    }

    pub fn last_outcome(&self) -> Option<&ReconcileOutcome> {
        self.last_outcome.as_ref()
    }

    /// Sign in. On failure the engine stays disconnected.
    pub async fn login(
        &mut self,
        email: &str,
        password: &str,
        now: DateTime<Local>,
    ) -> Result<Context> {
        self.email = Some(email.to_string());
        match self.api.login(email, password, now).await {
            Ok(context) => {
                info!(
                    employee_id = %context.employee_id,
                    period_id = %context.period_id,
                    "Logged in"
                );
                Ok(context)
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                Err(e)
            }
        }
    }

    /// Run the reconciler for one signal.
    ///
    /// The status is recomputed after any write the service accepted.
    pub async fn handle_signal(&mut self, signal: Signal, now: DateTime<Local>) -> Vec<CoreEvent> {
        debug!(%signal, "Handling signal");
        let outcome = reconcile(&mut self.api, signal, now).await;

        let mut events = vec![CoreEvent::from_outcome(signal, &outcome)];
        let changed = outcome.changed_state();
        self.last_outcome = Some(outcome);

        if changed && let Some(event) = self.refresh_status(now).await {
            events.push(event);
        }
        events
    }

    /// Recompute the status projection. Returns an event only if it changed.
    pub async fn refresh_status(&mut self, now: DateTime<Local>) -> Option<CoreEvent> {
        let status = project_status(&mut self.api, self.workday_hours, now).await;
        self.last_refresh = Some(now);

        if status == self.status {
            return None;
        }
        debug!(status = %status.displayable_text, "Status changed");
        self.status = status.clone();
        Some(CoreEvent::StatusChanged(status))
    }

    pub fn snapshot(&self) -> DaemonStateSnapshot {
        DaemonStateSnapshot {
            api_version: API_VERSION,
            logged_in: self.api.is_logged_in(),
            email: self.email.clone(),
            context: self.api.context(),
            status: self.status.clone(),
            last_outcome: self.last_outcome.clone(),
            last_refresh: self.last_refresh,
        }
    }
}

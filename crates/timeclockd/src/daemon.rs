//! Command and signal handling for timeclockd
//!
//! [`Daemon`] is everything the event loop does between receiving a message
//! and writing the reply. It owns the engine and never runs two handlers at
//! once.

use chrono::{DateTime, Local};
use std::sync::Arc;
use timeclock_api::{
    ClientRole, Command, ErrorCode, ErrorInfo, ResponsePayload, Signal,
};
use timeclock_core::{AttendanceApi, AttendanceEngine, CoreEvent};
use timeclock_host_api::CredentialStore;
use timeclock_util::{ClientId, TimeclockError};
use tracing::{debug, info, warn};

/// Result of handling one command
#[derive(Debug)]
pub struct Handled {
    pub response: Result<ResponsePayload, ErrorInfo>,
    /// Events to broadcast to subscribers
    pub events: Vec<CoreEvent>,
}

impl Handled {
    fn ok(payload: ResponsePayload) -> Self {
        Self {
            response: Ok(payload),
            events: Vec::new(),
        }
    }

    fn err(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            response: Err(ErrorInfo::new(code, message)),
            events: Vec::new(),
        }
    }
}

/// Protocol error for a failed core operation
pub fn error_info(e: &TimeclockError) -> ErrorInfo {
    let code = match e {
        TimeclockError::AuthError(_) => ErrorCode::AuthenticationFailed,
        TimeclockError::ApiError(_) => ErrorCode::ApiError,
        TimeclockError::ConfigError(_) => ErrorCode::ConfigError,
        TimeclockError::SystemEventError(_) | TimeclockError::Internal(_) => {
            ErrorCode::InternalError
        }
    };
    ErrorInfo::new(code, e.to_string())
}

pub struct Daemon<A> {
    engine: AttendanceEngine<A>,
    credentials: Arc<dyn CredentialStore>,
}

impl<A: AttendanceApi> Daemon<A> {
    pub fn new(engine: AttendanceEngine<A>, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            engine,
            credentials,
        }
    }

    pub fn engine(&self) -> &AttendanceEngine<A> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut AttendanceEngine<A> {
        &mut self.engine
    }

    /// Sign in with stored credentials, if any, and compute the first status
    pub async fn startup(&mut self, now: DateTime<Local>) -> Vec<CoreEvent> {
        if !self.credentials.has_credentials() {
            warn!("No credentials stored; run `timeclockctl set-credentials` to sign in");
            return self.refresh(now).await;
        }

        let mut handled = self.relogin(now).await;
        if let Err(e) = &handled.response {
            warn!(error = %e.message, "Startup login failed");
        }
        if !handled
            .events
            .iter()
            .any(|e| matches!(e, CoreEvent::StatusChanged(_)))
        {
            handled.events.extend(self.refresh(now).await);
        }
        handled.events
    }

    /// Signal from an OS event source
    pub async fn handle_signal(&mut self, signal: Signal, now: DateTime<Local>) -> Vec<CoreEvent> {
        self.engine.handle_signal(signal, now).await
    }

    /// Periodic status refresh
    pub async fn refresh(&mut self, now: DateTime<Local>) -> Vec<CoreEvent> {
        self.engine.refresh_status(now).await.into_iter().collect()
    }

    pub async fn handle_command(
        &mut self,
        client_id: &ClientId,
        role: ClientRole,
        command: Command,
        now: DateTime<Local>,
    ) -> Handled {
        if !role.can_run(&command) {
            warn!(client_id = %client_id, ?role, "Permission denied");
            return Handled::err(
                ErrorCode::PermissionDenied,
                "Command requires the daemon's own user",
            );
        }

        match command {
            Command::GetState => Handled::ok(ResponsePayload::State(self.engine.snapshot())),

            Command::GetStatus => Handled::ok(ResponsePayload::Status(self.engine.status().clone())),

            Command::RefreshStatus => {
                let events = self.refresh(now).await;
                Handled {
                    response: Ok(ResponsePayload::Status(self.engine.status().clone())),
                    events,
                }
            }

            Command::Signal { signal } => {
                info!(client_id = %client_id, %signal, "Manual signal");
                let events = self.engine.handle_signal(signal, now).await;
                match self.engine.last_outcome().cloned() {
                    Some(outcome) => Handled {
                        response: Ok(ResponsePayload::SignalHandled { signal, outcome }),
                        events,
                    },
                    None => Handled::err(ErrorCode::InternalError, "Signal produced no outcome"),
                }
            }

            Command::Relogin => self.relogin(now).await,

            Command::SetCredentials { email, password } => {
                if email.trim().is_empty() || password.expose().is_empty() {
                    return Handled::err(
                        ErrorCode::InvalidRequest,
                        "Email and password must not be empty",
                    );
                }
                if let Err(e) = self.credentials.set_credentials(email.trim(), password.expose()) {
                    let e: TimeclockError = e.into();
                    return Handled {
                        response: Err(error_info(&e)),
                        events: Vec::new(),
                    };
                }
                self.relogin(now).await
            }

            Command::SubscribeEvents => {
                debug!(client_id = %client_id, "Client subscribed");
                Handled::ok(ResponsePayload::Subscribed {
                    client_id: client_id.clone(),
                })
            }

            Command::UnsubscribeEvents => Handled::ok(ResponsePayload::Unsubscribed),

            Command::Ping => Handled::ok(ResponsePayload::Pong),
        }
    }

    async fn relogin(&mut self, now: DateTime<Local>) -> Handled {
        let Some(creds) = self.credentials.credentials() else {
            return Handled::err(ErrorCode::NoCredentials, "No credentials stored");
        };

        match self
            .engine
            .login(&creds.email, creds.password.expose(), now)
            .await
        {
            Ok(context) => {
                let payload = ResponsePayload::LoggedIn {
                    employee_id: context.employee_id,
                    period_id: context.period_id,
                };
                let mut events = vec![CoreEvent::LoggedIn { context }];
                events.extend(self.refresh(now).await);
                Handled {
                    response: Ok(payload),
                    events,
                }
            }
            Err(e) => {
                let mut events = vec![CoreEvent::LoginFailed {
                    message: e.to_string(),
                }];
                events.extend(self.refresh(now).await);
                Handled {
                    response: Err(error_info(&e)),
                    events,
                }
            }
        }
    }
}

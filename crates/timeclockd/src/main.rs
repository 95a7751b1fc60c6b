//! timeclockd - automatic clock-in/out daemon
//!
//! Wires together:
//! - Configuration loading
//! - Credential storage
//! - The attendance engine and its HR service client
//! - OS event sources (login, sleep/wake, resume detection)
//! - IPC server

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use timeclock_api::{ClientRole, Event, EventPayload, Response};
use timeclock_config::load_config_or_default;
use timeclock_core::{AttendanceClient, AttendanceEngine, CoreEvent, SessionConfig};
use timeclock_host_api::{CredentialStore, EventSource, SignalSender};
use timeclock_host_linux::{
    LoginTrigger, LogindSleepSource, ResumeDetector, UnixSignalSource, default_credential_store,
};
use timeclock_ipc::{IpcServer, ServerMessage};
use timeclock_util::{TimeclockError, default_config_path};
use timeclockd::Daemon;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// timeclockd - clocks you in and out of Factorial HR as your session starts and sleeps
#[derive(Parser, Debug)]
#[command(name = "timeclockd")]
#[command(about = "Automatic Factorial HR clock-in/out daemon", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/timeclock/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Socket path override (or set TIMECLOCK_SOCKET env var)
    #[arg(short, long, env = "TIMECLOCK_SOCKET")]
    socket: Option<PathBuf>,

    /// Data directory override (or set TIMECLOCK_DATA_DIR env var)
    #[arg(short, long, env = "TIMECLOCK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

struct Service {
    daemon: Daemon<AttendanceClient>,
    ipc: Arc<IpcServer>,
    sources: Vec<Box<dyn EventSource>>,
    refresh_interval: std::time::Duration,
}

impl Service {
    async fn new(args: &Args) -> Result<Self> {
        let settings = load_config_or_default(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?;

        info!(
            config_path = %args.config.display(),
            base_url = %settings.service.base_url,
            workday_hours = settings.workday_hours,
            "Configuration loaded"
        );

        let socket_path = args
            .socket
            .clone()
            .unwrap_or_else(|| settings.service.socket_path.clone());

        let data_dir = args
            .data_dir
            .clone()
            .unwrap_or_else(|| settings.service.data_dir.clone());

        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

        let credentials: Arc<dyn CredentialStore> = default_credential_store(&data_dir);

        let client = AttendanceClient::new(SessionConfig {
            base_url: settings.service.base_url.clone(),
            return_host: settings.service.return_host.clone(),
            request_timeout: settings.service.request_timeout,
        })
        .context("Failed to build HTTP client")?;
        let engine = AttendanceEngine::new(client, settings.workday_hours);

        let mut sources: Vec<Box<dyn EventSource>> = vec![
            Box::new(UnixSignalSource::new()),
            Box::new(LoginTrigger::new(settings.schedule.login_delay)),
            Box::new(LogindSleepSource::new(settings.service.request_timeout)),
        ];
        if let Some(poll) = settings.schedule.resume_poll {
            sources.push(Box::new(ResumeDetector::new(poll)));
        }

        let mut ipc = IpcServer::new(&socket_path);
        ipc.start().await?;

        Ok(Self {
            daemon: Daemon::new(engine, credentials),
            ipc: Arc::new(ipc),
            sources,
            refresh_interval: settings.schedule.refresh_interval,
        })
    }

    async fn run(self) -> Result<()> {
        let Service {
            mut daemon,
            ipc,
            sources,
            refresh_interval,
        } = self;

        let mut ipc_messages = ipc
            .take_message_receiver()
            .await
            .context("IPC message receiver already taken")?;

        let ipc_accept = ipc.clone();
        tokio::spawn(async move {
            if let Err(e) = ipc_accept.run().await {
                error!(error = %e, "IPC server error");
            }
        });

        let (signal_tx, mut signal_rx) = mpsc::unbounded_channel();
        for source in sources {
            spawn_source(source, signal_tx.clone());
        }
        drop(signal_tx);

        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
        let mut sighup =
            signal(SignalKind::hangup()).context("Failed to create SIGHUP handler")?;

        broadcast(&ipc, daemon.startup(timeclock_util::now()).await);

        let mut refresh_timer = tokio::time::interval(refresh_interval);
        // The first tick completes immediately and startup already refreshed
        refresh_timer.tick().await;

        info!("Service running");

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    break;
                }
                _ = sighup.recv() => {
                    info!("Received SIGHUP, shutting down gracefully");
                    break;
                }

                _ = refresh_timer.tick() => {
                    let events = daemon.refresh(timeclock_util::now()).await;
                    broadcast(&ipc, events);
                }

                Some(sig) = signal_rx.recv() => {
                    info!(signal = %sig, "Lifecycle signal");
                    let events = daemon.handle_signal(sig, timeclock_util::now()).await;
                    broadcast(&ipc, events);
                }

                Some(msg) = ipc_messages.recv() => {
                    handle_ipc_message(&mut daemon, &ipc, msg).await;
                }
            }
        }

        info!("Shutting down timeclockd");
        ipc.broadcast_event(Event::new(EventPayload::Shutdown));
        ipc.shutdown();
        info!("Shutdown complete");
        Ok(())
    }
}

fn spawn_source(source: Box<dyn EventSource>, tx: SignalSender) {
    tokio::spawn(async move {
        let name = source.name();
        debug!(source = name, "Starting event source");
        if let Err(e) = source.run(tx).await {
            let e: TimeclockError = e.into();
            error!(source = name, error = %e, "Event source stopped");
        }
    });
}

fn broadcast(ipc: &IpcServer, events: Vec<CoreEvent>) {
    for event in events {
        log_event(&event);
        ipc.broadcast_event(Event::new(event.to_payload()));
    }
}

fn log_event(event: &CoreEvent) {
    match event {
        CoreEvent::ClockedIn { signal, at } => info!(%signal, at = %at, "Clocked in"),
        CoreEvent::ClockedOut { signal, at } => info!(%signal, at = %at, "Clocked out"),
        CoreEvent::ActionRejected { signal, action } => {
            warn!(%signal, action = ?action, "Clock write rejected")
        }
        CoreEvent::HandlerFailed { signal, message } => {
            error!(%signal, error = %message, "Signal handler failed")
        }
        CoreEvent::LoginFailed { message } => warn!(error = %message, "Login failed"),
        CoreEvent::StatusChanged(status) => {
            debug!(status = %status.displayable_text, "Status changed")
        }
        other => debug!(event = ?other, "Core event"),
    }
}

async fn handle_ipc_message(
    daemon: &mut Daemon<AttendanceClient>,
    ipc: &IpcServer,
    msg: ServerMessage,
) {
    match msg {
        ServerMessage::Request { client_id, request } => {
            let role = ipc
                .get_client_info(&client_id)
                .await
                .map(|info| info.role)
                .unwrap_or(ClientRole::Observer);

            let request_id = request.request_id;
            let handled = daemon
                .handle_command(&client_id, role, request.command, timeclock_util::now())
                .await;

            let response = match handled.response {
                Ok(payload) => Response::success(request_id, payload),
                Err(error) => Response::error(request_id, error),
            };
            if let Err(e) = ipc.send_response(&client_id, response).await {
                warn!(client_id = %client_id, error = %e, "Failed to send response");
            }

            broadcast(ipc, handled.events);
        }

        ServerMessage::ClientConnected { client_id, info } => {
            debug!(client_id = %client_id, role = ?info.role, uid = ?info.uid, "Client registered");
        }

        ServerMessage::ClientDisconnected { client_id } => {
            debug!(client_id = %client_id, "Client disconnected");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "timeclockd starting");
    if timeclock_util::is_mock_time_active() {
        warn!(now = %timeclock_util::format_datetime_full(&timeclock_util::now()), "Mock time active");
    }

    let service = Service::new(&args).await?;
    service.run().await
}

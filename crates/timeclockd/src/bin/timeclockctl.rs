//! timeclockctl - command-line client for timeclockd
//!
//! Used interactively and from sleep hooks, e.g.
//! `timeclockctl signal sleep` before suspend. Unlike SIGUSR1 it waits for
//! the clock-out to finish before returning.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::io::{BufRead, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use timeclock_api::{Command, ResponsePayload, ResponseResult, Secret, Signal};
use timeclock_ipc::IpcClient;
use timeclock_util::default_socket_path;

#[derive(Parser, Debug)]
#[command(name = "timeclockctl")]
#[command(about = "Control the timeclockd daemon", long_about = None)]
struct Args {
    /// Socket path (default: $TIMECLOCK_SOCKET or the per-user runtime dir)
    #[arg(short, long, default_value_os_t = default_socket_path())]
    socket: PathBuf,

    #[command(subcommand)]
    command: CtlCommand,
}

#[derive(Subcommand, Debug)]
enum CtlCommand {
    /// Print the current status line
    Status,
    /// Print the full daemon state as JSON
    State,
    /// Recompute the status now
    Refresh,
    /// Deliver a lifecycle signal and wait for the outcome
    Signal { signal: Signal },
    /// Log in again with the stored credentials
    Login,
    /// Store credentials and log in. The password is read from
    /// TIMECLOCK_PASSWORD or the first line of stdin.
    SetCredentials {
        #[arg(short, long)]
        email: String,
    },
    /// Print events as they arrive
    Watch,
    /// Check that the daemon is alive
    Ping,
}

fn read_password() -> Result<String> {
    if let Ok(password) = std::env::var("TIMECLOCK_PASSWORD") {
        return Ok(password);
    }
    if std::io::stdin().is_terminal() {
        eprint!("Password: ");
    }
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("Empty password");
    }
    Ok(password)
}

async fn request(client: &mut IpcClient, command: Command) -> Result<ResponsePayload> {
    let response = client.send(command).await?;
    match response.result {
        ResponseResult::Ok(payload) => Ok(payload),
        ResponseResult::Err(e) => bail!("{:?}: {}", e.code, e.message),
    }
}

fn print_payload(payload: &ResponsePayload) -> Result<()> {
    match payload {
        ResponsePayload::Status(status) => {
            println!("{}", status.displayable_text);
            println!("{}", status.tooltip_text);
        }
        ResponsePayload::SignalHandled { signal, outcome } => {
            println!("{}: {}", signal, serde_json::to_string(outcome)?);
        }
        ResponsePayload::LoggedIn {
            employee_id,
            period_id,
        } => {
            println!("Logged in (employee {}, period {})", employee_id, period_id);
        }
        ResponsePayload::Pong => println!("pong"),
        other => println!("{}", serde_json::to_string_pretty(other)?),
    }
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let mut client = IpcClient::connect(&args.socket)
        .await
        .with_context(|| format!("Cannot connect to timeclockd at {:?}", args.socket))?;

    let command = match args.command {
        CtlCommand::Status => Command::GetStatus,
        CtlCommand::State => Command::GetState,
        CtlCommand::Refresh => Command::RefreshStatus,
        CtlCommand::Signal { signal } => Command::Signal { signal },
        CtlCommand::Login => Command::Relogin,
        CtlCommand::SetCredentials { email } => Command::SetCredentials {
            email,
            password: Secret::new(read_password()?),
        },
        CtlCommand::Ping => Command::Ping,
        CtlCommand::Watch => {
            let mut events = client.subscribe().await?;
            loop {
                let event = events.next().await?;
                println!("{}", serde_json::to_string(&event)?);
            }
        }
    };

    let payload = request(&mut client, command).await?;
    print_payload(&payload)
}

#[tokio::main]
async fn main() -> ExitCode {
    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

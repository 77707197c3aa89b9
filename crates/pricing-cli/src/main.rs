//! pricing-admin - manage the pricing tool product catalog from the terminal.
//!
//! Every API call goes through the session-aware gateway in `pricing-core`,
//! so an expired access token is refreshed once and the call replayed
//! without the user noticing.

mod cli;
mod commands;

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tokio::sync::broadcast;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};
use commands::App;
use pricing_core::{Config, SessionEvent};

/// Initialize the tracing subscriber for logging.
/// The returned guard flushes buffered log lines on drop.
fn init_tracing() -> WorkerGuard {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let (writer, guard) = tracing_appender::non_blocking(io::stderr());

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer))
        .with(filter)
        .init();
    guard
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    let _log_guard = init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", commands::describe_error(&e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;
    config.apply_overrides(cli.api_url);
    info!(api = %config.api_base_url, "pricing-admin starting");

    let gateway = config.connect()?;
    let mut events = gateway.subscribe();
    let mut app = App {
        config,
        gateway,
        json: cli.json,
    };

    let result = match cli.command {
        Commands::Login { email } => commands::login(&mut app, email).await,
        Commands::Register {
            username,
            email,
            role,
        } => commands::register(&app, &username, &email, &role).await,
        Commands::Logout => commands::logout(&app),
        Commands::Whoami => commands::whoami(&app),
        Commands::Config {
            set_api_url,
            credentials,
        } => commands::config(&mut app, set_api_url, credentials),
        Commands::Products(command) => commands::products(&app, command).await,
    };

    report_session_events(&mut events);
    result
}

/// Tell the user when the gateway ended the session during the command.
fn report_session_events(events: &mut broadcast::Receiver<SessionEvent>) {
    loop {
        match events.try_recv() {
            Ok(SessionEvent::LoginRequired { reason }) => {
                debug!(%reason, "Session ended");
                eprintln!("Session expired. Run `pricing-admin login` to sign in again.");
                return;
            }
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => return,
        }
    }
}

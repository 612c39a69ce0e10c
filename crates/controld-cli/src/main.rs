//! controld: hardware control daemon.
//!
//! Brings up the board, registers the command table and serves it on the
//! TCP command server and the interactive console until interrupted.

mod config;
mod console;
mod heartbeat;

use anyhow::{Context, Result};
use config::{Args, DaemonConfig, USAGE};
use console::ConsoleExit;
use controld_command::{CommandHandler, commands};
use controld_hardware::Board;
use controld_network::CommandServer;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{Signal, SignalKind, signal};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Time granted to blocking work (a console read in progress) at exit.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

fn main() -> Result<()> {
    let Some(args) = Args::parse(std::env::args().skip(1))? else {
        println!("{USAGE}");
        return Ok(());
    };

    init_logging(args.verbose);

    let mut config = match &args.config {
        Some(path) => DaemonConfig::load(path)?,
        None => DaemonConfig::default(),
    };
    args.apply(&mut config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let result = runtime.block_on(run(config));
    // Standard input reads cannot be interrupted
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(config: DaemonConfig) -> Result<()> {
    let board = Arc::new(Board::new(&config.board()).context("Failed to bring up board")?);

    let handler = CommandHandler::new();
    commands::register_all(&handler, &board);

    let shutdown = CancellationToken::new();
    let mut tasks = JoinSet::new();

    tasks.spawn(heartbeat::run(board.clone(), shutdown.clone()));

    if config.server.enabled {
        let server = CommandServer::bind(config.server.config.clone(), handler.clone()).await?;
        tasks.spawn(server.run(shutdown.clone()));
    }

    if config.console {
        let handler = handler.clone();
        let shutdown = shutdown.clone();
        tasks.spawn(async move {
            match console::run_stdio(handler, shutdown.clone()).await {
                Ok(ConsoleExit::Quit) => {
                    info!("quit requested from console");
                    shutdown.cancel();
                }
                Ok(ConsoleExit::Eof) => info!("console closed"),
                Ok(ConsoleExit::Shutdown) => {}
                Err(e) => warn!(error = %e, "console failed"),
            }
        });
    }

    let terminate =
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
    info!("controld running");
    tokio::select! {
        name = termination(terminate) => info!(signal = name, "shutdown requested"),
        _ = shutdown.cancelled() => {}
    }

    shutdown.cancel();
    while let Some(finished) = tasks.join_next().await {
        if let Err(e) = finished {
            error!(error = %e, "task failed during shutdown");
        }
    }
    info!("controld stopped");
    Ok(())
}

/// Wait for SIGINT or SIGTERM and name the one that arrived.
async fn termination(mut terminate: Signal) -> &'static str {
    tokio::select! {
        Ok(()) = tokio::signal::ctrl_c() => "SIGINT",
        Some(()) = terminate.recv() => "SIGTERM",
        else => std::future::pending().await,
    }
}

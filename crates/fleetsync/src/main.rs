// SPDX-FileCopyrightText: 2026 Fleetsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fleetsync - offline action queue and sync engine for the municipal
//! fleet driver portal.
//!
//! This binary is the operational harness around the sync engine crates:
//! inspect the outbox, trigger a manual pass, or run the connectivity-driven
//! sync loop as a foreground service.

mod runner;
mod status;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fleetsync_config::FleetsyncConfig;
use fleetsync_connectivity::{Connectivity, ConnectivityMonitor};
use fleetsync_core::FleetsyncError;
use fleetsync_engine::SyncEngine;
use fleetsync_outbox::Outbox;
use fleetsync_transport::HttpTransport;

/// Fleetsync - offline action sync for the fleet driver portal.
#[derive(Parser, Debug)]
#[command(name = "fleetsync", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Show sync status: pending count, last sync, last error.
    Status {
        /// Output machine-readable JSON.
        #[arg(long)]
        json: bool,
    },
    /// List pending actions in the outbox.
    Queue,
    /// Run one manual sync pass now.
    Sync,
    /// Run the connectivity-driven sync loop until interrupted.
    Run,
    /// Administrative reset: drop all pending actions and sync metadata.
    Clear {
        /// Confirm the reset; without this flag nothing is dropped.
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match fleetsync_config::load_and_validate() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("fleetsync: {e}");
            std::process::exit(1);
        }
    };

    init_tracing(&config);

    if let Err(e) = dispatch(cli, &config).await {
        eprintln!("fleetsync: {e}");
        std::process::exit(1);
    }
}

/// `FLEETSYNC_LOG` takes precedence as a full EnvFilter; otherwise the
/// configured level applies globally.
fn init_tracing(config: &FleetsyncConfig) {
    let filter = EnvFilter::try_from_env("FLEETSYNC_LOG")
        .unwrap_or_else(|_| EnvFilter::new(config.log.level.clone()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn dispatch(cli: Cli, config: &FleetsyncConfig) -> Result<(), FleetsyncError> {
    let outbox = Arc::new(Outbox::open(&config.storage, config.sync.max_attempts)?);
    if outbox.recovered() {
        eprintln!(
            "warning: outbox document at {} could not be read; starting from an empty queue",
            outbox.path().display()
        );
    }

    match cli.command {
        Some(Commands::Status { json }) => status::run_status(&outbox, json),
        Some(Commands::Queue) => status::run_queue(&outbox),
        Some(Commands::Sync) => {
            let engine = build_engine(
                outbox,
                config,
                // Manual trigger: the operator asserts connectivity; the
                // transport finds out the truth.
                &ConnectivityMonitor::new(Connectivity::Online),
            )?;
            let report = engine.sync_now().await?;
            println!(
                "sync pass: {} attempted, {} confirmed, {} failed, {} dead-lettered",
                report.attempted, report.succeeded, report.failed, report.dead_lettered
            );
            Ok(())
        }
        Some(Commands::Run) => runner::run_service(outbox, config).await,
        Some(Commands::Clear { yes }) => {
            if !yes {
                return Err(FleetsyncError::Config(
                    "refusing to clear the outbox without --yes".into(),
                ));
            }
            let dropped = outbox.pending_count()?;
            outbox.clear()?;
            println!("outbox cleared ({dropped} pending action(s) dropped)");
            Ok(())
        }
        None => {
            println!("fleetsync: use --help for available commands");
            Ok(())
        }
    }
}

/// Wire an engine around the shared outbox and the given monitor.
fn build_engine(
    outbox: Arc<Outbox>,
    config: &FleetsyncConfig,
    monitor: &ConnectivityMonitor,
) -> Result<SyncEngine, FleetsyncError> {
    let transport = Arc::new(HttpTransport::new(&config.api)?);
    Ok(SyncEngine::new(
        outbox,
        transport,
        monitor.subscribe(),
        config.sync.clone(),
    ))
}

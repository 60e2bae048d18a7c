// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// printpulse — SNMP printer status poller
//
// Entry point. Initialises logging and backend services, then runs one
// subcommand.

#![recursion_limit = "256"]

mod cli;
mod services;

use std::process::ExitCode;

use clap::Parser;
use printpulse_core::DeviceId;
use printpulse_core::error::Result;

use cli::{Cli, Commands};
use services::app_services::AppServices;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::info!("printpulse starting");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "printpulse failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let services = AppServices::init(cli.data_dir.as_deref())?;

    match cli.command {
        Commands::Prewarm { force } => {
            let refreshed = services.prewarm(force).await;
            println!("Prewarmed {refreshed} printers (force={force})");
        }
        Commands::Status { device_id, force } => {
            let payload = services.status(DeviceId(device_id), force).await?;
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        Commands::List => {
            let payloads = services.list();
            println!("{}", serde_json::to_string_pretty(&payloads)?);
        }
    }
    Ok(())
}

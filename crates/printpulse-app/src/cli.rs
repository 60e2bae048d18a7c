// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Poll networked printers over SNMP and keep their status cache warm.
#[derive(Parser, Debug)]
#[command(name = "printpulse", version, about, long_about = None)]
pub struct Cli {
    /// Directory holding config.json, devices.json and the status database
    #[arg(long, env = "PRINTPULSE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Refresh the cached status of every printer in the inventory
    Prewarm {
        /// Force refresh for each printer, ignoring the cache window
        #[arg(long)]
        force: bool,
    },
    /// Print one printer's status payload as JSON, refreshing if stale
    Status {
        /// Inventory id of the printer
        device_id: i64,
        /// Poll even if the cached status is still fresh
        #[arg(long)]
        force: bool,
    },
    /// Print the cached status payload of every printer, without polling
    List,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prewarm_force() {
        let cli = Cli::try_parse_from(["printpulse", "prewarm", "--force"]).expect("parse");
        assert!(matches!(cli.command, Commands::Prewarm { force: true }));
    }

    #[test]
    fn parses_status_with_data_dir() {
        let cli = Cli::try_parse_from(["printpulse", "--data-dir", "/srv/pp", "status", "42"])
            .expect("parse");
        assert_eq!(cli.data_dir, Some(PathBuf::from("/srv/pp")));
        assert!(matches!(
            cli.command,
            Commands::Status {
                device_id: 42,
                force: false
            }
        ));
    }

    #[test]
    fn status_requires_device_id() {
        assert!(Cli::try_parse_from(["printpulse", "status"]).is_err());
    }
}

//! Command-line interface definitions and parsing

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override the scan window, in seconds
    #[arg(long, value_name = "SECS")]
    pub scan_secs: Option<u64>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Scan for named BLE devices and list them
    Scan,
    /// Connect to a UART device and open an interactive terminal
    Connect {
        /// Device address, or its advertised name
        target: String,
    },
    /// Show adapter and session status
    Status,
}

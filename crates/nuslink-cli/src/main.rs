//! nuslink - terminal client for Nordic UART Service devices

use clap::Parser;
use tracing::{error, info};

use nuslink_cli::{cli::Cli, commands::CommandDispatcher, config::AppConfig, error::Result};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let mut config = load_configuration(&cli)?;
    if let Some(secs) = cli.scan_secs {
        config = config.with_scan_secs(secs);
        config.validate()?;
    }

    if let Err(e) = CommandDispatcher::execute(cli.command, config).await {
        error!("Command failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Setup logging based on verbosity level. Logs go to stderr so they do not mix with
/// terminal traffic on stdout.
fn setup_logging(verbose: bool) {
    let log_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// Load configuration from file or use defaults
fn load_configuration(cli: &Cli) -> Result<AppConfig> {
    if let Some(config_path) = &cli.config {
        info!("Loading configuration from: {}", config_path);
        AppConfig::load_from_file(config_path)
    } else {
        Ok(AppConfig::default())
    }
}

//! Command handlers for the nuslink CLI

use std::collections::HashSet;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use nuslink_ble::BtleBinding;
use nuslink_core::{ClientError, DiscoveredDevice, NusClient};

use crate::cli::Commands;
use crate::config::AppConfig;
use crate::error::{CliError, Result};
use crate::terminal::TerminalSession;

/// Whether `device` is the one the user asked for, by address or advertised name
pub fn matches_target(device: &DiscoveredDevice, target: &str) -> bool {
    device.address.eq_ignore_ascii_case(target) || device.name == target
}

/// Command dispatcher for handling CLI commands
pub struct CommandDispatcher;

impl CommandDispatcher {
    /// Execute a CLI command against a fresh session
    pub async fn execute(command: Commands, config: AppConfig) -> Result<()> {
        let binding = BtleBinding::with_config(config.ble.clone()).await?;
        let (client, task) = NusClient::builder(Arc::new(binding))
            .with_config(config.session.clone())
            .spawn();

        let result = match command {
            Commands::Scan => Self::handle_scan_command(&client).await,
            Commands::Connect { target } => {
                Self::handle_connect_command(&client, &target, &config).await
            }
            Commands::Status => Self::handle_status_command(&client, &config).await,
        };

        Self::shutdown(client, task).await;
        result
    }

    async fn shutdown(client: NusClient, task: JoinHandle<()>) {
        if let Err(e) = client.shutdown().await {
            warn!("Session already stopped: {}", e);
        }
        drop(client);
        if let Err(e) = task.await {
            warn!("Session task ended abnormally: {}", e);
        }
    }

    /// Handle the scan command
    async fn handle_scan_command(client: &NusClient) -> Result<()> {
        let mut updates = client.subscribe();
        client.start_scan().await?;
        println!("Scanning for devices... Press Ctrl+C to stop");

        let mut listed = HashSet::new();
        loop {
            let snapshot = updates.borrow_and_update().clone();
            for device in &snapshot.discovered_devices {
                if listed.insert(device.address.clone()) {
                    println!("  {}", device);
                }
            }
            if !snapshot.is_scanning {
                if let Some(error) = snapshot.error {
                    return Err(error.into());
                }
                break;
            }

            tokio::select! {
                changed = updates.changed() => {
                    if changed.is_err() {
                        return Err(ClientError::SessionClosed.into());
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    client.stop_scan().await?;
                }
            }
        }

        if listed.is_empty() {
            println!("No devices found");
        } else {
            println!("{} device(s) found", listed.len());
        }
        Ok(())
    }

    /// Handle the connect command
    async fn handle_connect_command(
        client: &NusClient,
        target: &str,
        config: &AppConfig,
    ) -> Result<()> {
        info!("Looking for {}", target);
        let device = Self::find_device(client, target).await?;

        client.connect(device.clone()).await?;
        let snapshot = client.snapshot();
        if let Some(error) = snapshot.error {
            return Err(error.into());
        }
        if !snapshot.is_connected() {
            return Err(CliError::DeviceNotFound(target.to_string()));
        }

        println!(
            "Connected to {}. Type {} to disconnect.",
            device, config.cli.quit_command
        );
        TerminalSession::new(client.clone(), config.cli.clone())
            .run()
            .await?;
        println!("Disconnected");
        Ok(())
    }

    /// Scan until `target` is sighted or the scan window closes
    async fn find_device(client: &NusClient, target: &str) -> Result<DiscoveredDevice> {
        let mut updates = client.subscribe();
        client.start_scan().await?;

        loop {
            {
                let snapshot = updates.borrow_and_update();
                if let Some(device) = snapshot
                    .discovered_devices
                    .iter()
                    .find(|d| matches_target(d, target))
                {
                    return Ok(device.clone());
                }
                if !snapshot.is_scanning {
                    return Err(match &snapshot.error {
                        Some(error) => error.clone().into(),
                        None => CliError::DeviceNotFound(target.to_string()),
                    });
                }
            }

            if updates.changed().await.is_err() {
                return Err(ClientError::SessionClosed.into());
            }
        }
    }

    /// Handle the status command
    async fn handle_status_command(client: &NusClient, config: &AppConfig) -> Result<()> {
        let enabled = client.check_availability().await?;
        let snapshot = client.snapshot();

        println!("nuslink Status");
        println!("==============");
        println!("Adapter: {}", snapshot.adapter_power_state);
        println!("Ready: {}", if enabled { "yes" } else { "no" });
        println!("Connection: {}", snapshot.connection_state);

        println!("\nSession Settings:");
        println!("  Scan window: {:?}", config.session.scan_duration);
        println!("  Connect timeout: {:?}", config.session.connect_timeout);
        println!("  Inbound log capacity: {}", config.session.inbound_log_capacity);
        println!("  Write chunk size: {} bytes", config.ble.write_mtu);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_by_address_or_name() {
        let device = DiscoveredDevice::new("AA:BB:CC:DD:EE:FF", "Sensor", Some(-60));
        assert!(matches_target(&device, "aa:bb:cc:dd:ee:ff"));
        assert!(matches_target(&device, "Sensor"));
        assert!(!matches_target(&device, "sensor"));
        assert!(!matches_target(&device, "11:22:33:44:55:66"));
    }
}

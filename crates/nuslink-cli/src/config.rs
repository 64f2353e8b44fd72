//! nuslink CLI configuration
//!
//! Configuration is read from an optional TOML file with three tables, each of which
//! may be partial or absent:
//!
//! ```toml
//! [session]
//! inbound_log_capacity = 200
//! scan_duration = { secs = 5, nanos = 0 }
//!
//! [ble]
//! write_with_response = false
//!
//! [cli]
//! quit_command = "/exit"
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use nuslink_ble::BleBindingConfig;
use nuslink_core::SessionConfig;

use crate::error::{CliError, Result};

// ----------------------------------------------------------------------------
// Application Configuration
// ----------------------------------------------------------------------------

/// Complete configuration for the CLI
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Session timing and buffer settings
    pub session: SessionConfig,
    /// Adapter selection and write settings
    pub ble: BleBindingConfig,
    /// Terminal behavior
    pub cli: CliConfig,
}

/// Terminal options for the interactive `connect` mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Input line that disconnects and exits
    pub quit_command: String,
    /// Appended to every line typed before it is sent
    pub line_ending: String,
    /// Print connection state transitions
    pub show_state_changes: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            quit_command: "/quit".to_string(),
            line_ending: "\n".to_string(),
            show_state_changes: true,
        }
    }
}

// ----------------------------------------------------------------------------
// Configuration Loading
// ----------------------------------------------------------------------------

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Override the scan window
    pub fn with_scan_secs(mut self, secs: u64) -> Self {
        self.session.scan_duration = Duration::from_secs(secs);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.session.scan_duration.is_zero() {
            return Err(CliError::Config(
                "Scan duration must be greater than 0".to_string(),
            ));
        }
        if self.ble.write_mtu == 0 {
            return Err(CliError::Config(
                "Write MTU must be greater than 0".to_string(),
            ));
        }
        if self.cli.quit_command.trim().is_empty() {
            return Err(CliError::Config("Quit command must not be empty".to_string()));
        }
        Ok(())
    }
}

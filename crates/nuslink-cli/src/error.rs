//! Error handling for the nuslink CLI

use nuslink_ble::BleBindingError;
use nuslink_core::{ClientError, SessionError};
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Session(#[from] SessionError),

    #[error("{0}")]
    Client(#[from] ClientError),

    #[error("BLE initialization failed: {0}")]
    Ble(#[from] BleBindingError),

    #[error("No device matching '{0}' was found")]
    DeviceNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::Config(format!("{:#}", err))
    }
}

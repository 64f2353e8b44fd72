//! Error types for the btleplug binding

use nuslink_core::BindingError;
use thiserror::Error;

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

/// Errors raised while driving btleplug
#[derive(Error, Debug)]
pub enum BleBindingError {
    #[error("BLE adapter not available")]
    AdapterNotAvailable,

    #[error("Failed to create BLE manager: {0}")]
    Manager(String),

    #[error("Device not found: {address}")]
    DeviceNotFound { address: String },

    #[error("Failed to connect to device: {0}")]
    ConnectionFailed(String),

    #[error("Connection timeout")]
    ConnectionTimeout,

    #[error("Characteristic not found: {characteristic}")]
    CharacteristicNotFound { characteristic: String },

    #[error("Operation not supported: {0}")]
    Unsupported(String),

    #[error("BLE error: {0}")]
    Btle(#[from] btleplug::Error),
}

impl From<BleBindingError> for BindingError {
    fn from(err: BleBindingError) -> Self {
        match err {
            BleBindingError::AdapterNotAvailable => BindingError::AdapterNotAvailable,
            BleBindingError::ConnectionTimeout => BindingError::ConnectionTimeout,
            BleBindingError::DeviceNotFound { address } => BindingError::DeviceNotFound { address },
            BleBindingError::CharacteristicNotFound { characteristic } => {
                BindingError::CharacteristicNotFound { characteristic }
            }
            BleBindingError::Unsupported(what) => BindingError::Unsupported(what),
            other => BindingError::Other(other.to_string()),
        }
    }
}

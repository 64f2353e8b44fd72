//! Error types for the NUS session

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ----------------------------------------------------------------------------
// Session Errors
// ----------------------------------------------------------------------------

/// Classification of every failure the session surfaces through its error slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    AdapterUnavailable,
    AdapterDisabled,
    PermissionDenied,
    ScanFailed,
    ConnectFailed,
    ServiceNotFound,
    DisconnectFailed,
    SendFailed,
    NoActiveConnection,
}

impl ErrorKind {
    /// Message shown when the underlying cause carries none
    pub fn default_message(self) -> &'static str {
        match self {
            ErrorKind::AdapterUnavailable => "Bluetooth is not available on this device",
            ErrorKind::AdapterDisabled => "Bluetooth is not enabled",
            ErrorKind::PermissionDenied => "Bluetooth permission denied",
            ErrorKind::ScanFailed => "Failed to start device scan",
            ErrorKind::ConnectFailed => "Failed to connect to device",
            ErrorKind::ServiceNotFound => "UART service not found on device",
            ErrorKind::DisconnectFailed => "Failed to disconnect from device",
            ErrorKind::SendFailed => "Failed to send data",
            ErrorKind::NoActiveConnection => "No device connected",
        }
    }
}

/// The value held in the session error slot
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct SessionError {
    pub kind: ErrorKind,
    pub message: String,
}

impl SessionError {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: kind.default_message().to_string(),
        }
    }

    /// Build an error carrying the cause's message, falling back to the kind's default
    /// when the cause has nothing to say
    pub fn with_message(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            return Self::new(kind);
        }
        Self { kind, message }
    }
}

impl From<ErrorKind> for SessionError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

// ----------------------------------------------------------------------------
// Adapter Binding Errors
// ----------------------------------------------------------------------------

/// Failures reported by an adapter binding
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    #[error("BLE adapter not available")]
    AdapterNotAvailable,

    #[error("Operation not supported on this platform: {0}")]
    Unsupported(String),

    #[error("Connection timeout")]
    ConnectionTimeout,

    #[error("Device not found: {address}")]
    DeviceNotFound { address: String },

    #[error("Characteristic not found: {characteristic}")]
    CharacteristicNotFound { characteristic: String },

    #[error("{0}")]
    Other(String),
}

impl BindingError {
    /// Convert into a session error of the given kind, keeping the binding's message
    pub fn into_session(self, kind: ErrorKind) -> SessionError {
        SessionError::with_message(kind, self.to_string())
    }
}

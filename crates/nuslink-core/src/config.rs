//! Session configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// Configuration
// ----------------------------------------------------------------------------

/// Default scan window before the scan stops on its own
pub const DEFAULT_SCAN_DURATION: Duration = Duration::from_millis(12_000);
/// Default bound handed to the binding's connect primitive
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(10_000);
/// Default number of inbound lines retained
pub const DEFAULT_INBOUND_LOG_CAPACITY: usize = 100;

/// Configuration for a NUS session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long a scan runs before it is stopped automatically
    pub scan_duration: Duration,
    /// Maximum time to wait for the link to come up
    pub connect_timeout: Duration,
    /// Maximum number of inbound entries kept, oldest evicted first
    pub inbound_log_capacity: usize,
    /// Depth of the command queue between the facade and the session task
    pub command_buffer_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            scan_duration: DEFAULT_SCAN_DURATION,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            inbound_log_capacity: DEFAULT_INBOUND_LOG_CAPACITY,
            command_buffer_size: 32,
        }
    }
}

impl SessionConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set scan duration
    pub fn with_scan_duration(mut self, duration: Duration) -> Self {
        self.scan_duration = duration;
        self
    }

    /// Set connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set inbound log capacity
    pub fn with_inbound_log_capacity(mut self, capacity: usize) -> Self {
        self.inbound_log_capacity = capacity;
        self
    }

    /// Set command queue depth
    pub fn with_command_buffer_size(mut self, size: usize) -> Self {
        self.command_buffer_size = size.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.scan_duration, Duration::from_millis(12_000));
        assert_eq!(config.connect_timeout, Duration::from_millis(10_000));
        assert_eq!(config.inbound_log_capacity, 100);
    }

    #[test]
    fn test_builders() {
        let config = SessionConfig::new()
            .with_scan_duration(Duration::from_secs(3))
            .with_inbound_log_capacity(5)
            .with_command_buffer_size(0);
        assert_eq!(config.scan_duration, Duration::from_secs(3));
        assert_eq!(config.inbound_log_capacity, 5);
        assert_eq!(config.command_buffer_size, 1);
        assert_eq!(config.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
    }
}

//! btleplug binding configuration

use nuslink_core::DEFAULT_WRITE_MTU;

// ----------------------------------------------------------------------------
// Configuration
// ----------------------------------------------------------------------------

/// Configuration for the btleplug adapter binding
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BleBindingConfig {
    /// Index into the system's adapter list
    pub adapter_index: usize,
    /// Largest single write to the outbound characteristic
    pub write_mtu: usize,
    /// Whether outbound writes wait for an acknowledgement
    pub write_with_response: bool,
}

impl Default for BleBindingConfig {
    fn default() -> Self {
        Self {
            adapter_index: 0,
            write_mtu: DEFAULT_WRITE_MTU,
            write_with_response: true,
        }
    }
}

impl BleBindingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_adapter_index(mut self, index: usize) -> Self {
        self.adapter_index = index;
        self
    }

    /// Set the write chunk size. Zero is raised to one byte.
    pub fn with_write_mtu(mut self, mtu: usize) -> Self {
        self.write_mtu = mtu.max(1);
        self
    }

    pub fn with_write_with_response(mut self, enabled: bool) -> Self {
        self.write_with_response = enabled;
        self
    }
}

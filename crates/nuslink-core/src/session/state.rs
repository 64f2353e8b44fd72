//! Session state and the snapshot handed to the presentation layer

use serde::{Deserialize, Serialize};

use crate::device::{AdapterPowerState, ConnectionState, DiscoveredDevice};
use crate::error::SessionError;
use crate::inbound::InboundLog;

// ----------------------------------------------------------------------------
// Session State
// ----------------------------------------------------------------------------

/// State owned by the session task. Only the reducer mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub adapter_power_state: AdapterPowerState,
    pub is_scanning: bool,
    /// Insertion-ordered, one entry per address
    pub discovered_devices: Vec<DiscoveredDevice>,
    pub connection_state: ConnectionState,
    pub connected_device: Option<DiscoveredDevice>,
    pub error: Option<SessionError>,
    pub inbound_log: InboundLog,
}

impl SessionState {
    pub fn new(inbound_log_capacity: usize) -> Self {
        Self {
            adapter_power_state: AdapterPowerState::Unknown,
            is_scanning: false,
            discovered_devices: Vec::new(),
            connection_state: ConnectionState::Disconnected,
            connected_device: None,
            error: None,
            inbound_log: InboundLog::new(inbound_log_capacity),
        }
    }

    pub fn snapshot(&self) -> ClientSnapshot {
        ClientSnapshot {
            adapter_power_state: self.adapter_power_state,
            is_scanning: self.is_scanning,
            discovered_devices: self.discovered_devices.clone(),
            connection_state: self.connection_state,
            connected_device: self.connected_device.clone(),
            error: self.error.clone(),
            inbound_log: self.inbound_log.to_vec(),
            inbound_seq: self.inbound_log.appended(),
        }
    }
}

// ----------------------------------------------------------------------------
// Client Snapshot
// ----------------------------------------------------------------------------

/// Immutable view of the session, published after every state change
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSnapshot {
    pub adapter_power_state: AdapterPowerState,
    pub is_scanning: bool,
    pub discovered_devices: Vec<DiscoveredDevice>,
    pub connection_state: ConnectionState,
    pub connected_device: Option<DiscoveredDevice>,
    pub error: Option<SessionError>,
    pub inbound_log: Vec<String>,
    /// Total lines ever appended to the inbound log; the last entry of
    /// `inbound_log` carries this sequence number
    pub inbound_seq: u64,
}

impl ClientSnapshot {
    pub fn is_connected(&self) -> bool {
        self.connection_state.is_connected()
    }

    /// Inbound entries appended after sequence number `seen`, oldest first.
    /// Lines already evicted from the bounded log are not returned.
    pub fn inbound_since(&self, seen: u64) -> &[String] {
        let fresh = self.inbound_seq.saturating_sub(seen);
        let len = self.inbound_log.len();
        let fresh = usize::try_from(fresh).unwrap_or(usize::MAX).min(len);
        &self.inbound_log[len - fresh..]
    }

    pub fn device(&self, address: &str) -> Option<&DiscoveredDevice> {
        self.discovered_devices.iter().find(|d| d.address == address)
    }
}

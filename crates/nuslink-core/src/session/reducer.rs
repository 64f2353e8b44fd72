//! Session reducer
//!
//! Every state change goes through [`reduce`]. The session task turns commands and
//! binding events into [`Action`]s; this module never performs I/O.

use crate::device::{AdapterPowerState, ConnectionState, DiscoveredDevice};
use crate::error::SessionError;

use super::state::SessionState;

/// A single state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SetAdapterState(AdapterPowerState),
    SetScanning(bool),
    ClearDiscovered,
    /// Ignored when the address is already listed
    AddDiscovered(DiscoveredDevice),
    SetConnectedDevice(Option<DiscoveredDevice>),
    SetConnectionState(ConnectionState),
    SetError(Option<SessionError>),
    AppendInbound(String),
    ClearInbound,
}

/// Apply `action` to `state`. Returns whether anything changed.
pub fn reduce(state: &mut SessionState, action: Action) -> bool {
    match action {
        Action::SetAdapterState(power) => replace(&mut state.adapter_power_state, power),
        Action::SetScanning(scanning) => replace(&mut state.is_scanning, scanning),
        Action::ClearDiscovered => {
            let changed = !state.discovered_devices.is_empty();
            state.discovered_devices.clear();
            changed
        }
        Action::AddDiscovered(device) => {
            if state
                .discovered_devices
                .iter()
                .any(|d| d.address == device.address)
            {
                return false;
            }
            state.discovered_devices.push(device);
            true
        }
        Action::SetConnectedDevice(device) => replace(&mut state.connected_device, device),
        Action::SetConnectionState(connection) => {
            replace(&mut state.connection_state, connection)
        }
        Action::SetError(error) => replace(&mut state.error, error),
        Action::AppendInbound(entry) => {
            state.inbound_log.push(entry);
            true
        }
        Action::ClearInbound => {
            let changed = !state.inbound_log.is_empty();
            state.inbound_log.clear();
            changed
        }
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

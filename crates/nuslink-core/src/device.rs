//! Device, adapter and connection state types

use std::fmt;

use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// Adapter Power State
// ----------------------------------------------------------------------------

/// Raw radio state as reported by a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioState {
    Unknown,
    Resetting,
    Unsupported,
    Unauthorized,
    PoweredOff,
    PoweredOn,
}

/// Power state of the local adapter as seen by the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AdapterPowerState {
    #[default]
    Unknown,
    Unavailable,
    Disabled,
    Enabled,
}

impl From<RadioState> for AdapterPowerState {
    fn from(state: RadioState) -> Self {
        match state {
            RadioState::PoweredOn => AdapterPowerState::Enabled,
            RadioState::PoweredOff => AdapterPowerState::Disabled,
            RadioState::Unsupported => AdapterPowerState::Unavailable,
            RadioState::Unknown | RadioState::Resetting | RadioState::Unauthorized => {
                AdapterPowerState::Unknown
            }
        }
    }
}

impl fmt::Display for AdapterPowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AdapterPowerState::Unknown => "unknown",
            AdapterPowerState::Unavailable => "unavailable",
            AdapterPowerState::Disabled => "disabled",
            AdapterPowerState::Enabled => "enabled",
        };
        f.write_str(label)
    }
}

// ----------------------------------------------------------------------------
// Connection State
// ----------------------------------------------------------------------------

/// Lifecycle of the single connection session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        *self == ConnectionState::Connected
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnecting => "disconnecting",
        };
        f.write_str(label)
    }
}

// ----------------------------------------------------------------------------
// Discovered Devices
// ----------------------------------------------------------------------------

/// One scan sighting delivered by a binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    /// Opaque identifier, stable per physical device for the scan session
    pub id: String,
    /// Advertised name, if the device broadcast one
    pub name: Option<String>,
    /// Signal strength in dBm
    pub rssi: Option<i16>,
}

/// A device listed to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredDevice {
    pub id: String,
    pub name: String,
    /// Primary key; equals `id`
    pub address: String,
    pub rssi: Option<i16>,
}

impl DiscoveredDevice {
    pub fn new(id: impl Into<String>, name: impl Into<String>, rssi: Option<i16>) -> Self {
        let id = id.into();
        Self {
            address: id.clone(),
            id,
            name: name.into(),
            rssi,
        }
    }

    /// Build a device from an advertisement. Sightings without an advertised name yield
    /// nothing; unnamed devices are never listed.
    pub fn from_advertisement(advertisement: &Advertisement) -> Option<Self> {
        let name = advertisement.name.as_deref()?;
        if name.is_empty() {
            return None;
        }
        Some(Self::new(advertisement.id.clone(), name, advertisement.rssi))
    }
}

impl fmt::Display for DiscoveredDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rssi {
            Some(rssi) => write!(f, "{} ({}) {} dBm", self.name, self.address, rssi),
            None => write!(f, "{} ({})", self.name, self.address),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radio_state_mapping() {
        assert_eq!(AdapterPowerState::from(RadioState::PoweredOn), AdapterPowerState::Enabled);
        assert_eq!(AdapterPowerState::from(RadioState::PoweredOff), AdapterPowerState::Disabled);
        assert_eq!(
            AdapterPowerState::from(RadioState::Unsupported),
            AdapterPowerState::Unavailable
        );
        assert_eq!(AdapterPowerState::from(RadioState::Resetting), AdapterPowerState::Unknown);
    }

    #[test]
    fn test_unnamed_advertisement_is_dropped() {
        let mut advertisement = Advertisement {
            id: "AA:BB".to_string(),
            name: None,
            rssi: Some(-40),
        };
        assert!(DiscoveredDevice::from_advertisement(&advertisement).is_none());

        advertisement.name = Some(String::new());
        assert!(DiscoveredDevice::from_advertisement(&advertisement).is_none());

        advertisement.name = Some("Sensor".to_string());
        let device = DiscoveredDevice::from_advertisement(&advertisement).unwrap();
        assert_eq!(device.address, "AA:BB");
        assert_eq!(device.id, device.address);
        assert_eq!(device.rssi, Some(-40));
    }
}

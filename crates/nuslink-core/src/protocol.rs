//! Nordic UART Service constants

use uuid::Uuid;

// ----------------------------------------------------------------------------
// NUS Service and Characteristic UUIDs
// ----------------------------------------------------------------------------

/// Nordic UART Service UUID
pub const NUS_SERVICE_UUID: Uuid = Uuid::from_u128(0x6E400001_B5A3_F393_E0A9_E50E24DCCA9E);

/// Characteristic the client writes to (device RX, our outbound)
pub const NUS_TX_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x6E400002_B5A3_F393_E0A9_E50E24DCCA9E);

/// Characteristic the device notifies on (device TX, our inbound)
pub const NUS_RX_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x6E400003_B5A3_F393_E0A9_E50E24DCCA9E);

/// Whether a service list advertises the UART service.
///
/// `Uuid` equality is over the parsed 128-bit value, so textual case in whatever the
/// binding parsed from is irrelevant.
pub fn has_uart_service(services: &[Uuid]) -> bool {
    services.iter().any(|uuid| *uuid == NUS_SERVICE_UUID)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_strings() {
        assert_eq!(
            NUS_SERVICE_UUID.to_string(),
            "6e400001-b5a3-f393-e0a9-e50e24dcca9e"
        );
        assert_eq!(
            NUS_TX_CHARACTERISTIC_UUID.to_string(),
            "6e400002-b5a3-f393-e0a9-e50e24dcca9e"
        );
        assert_eq!(
            NUS_RX_CHARACTERISTIC_UUID.to_string(),
            "6e400003-b5a3-f393-e0a9-e50e24dcca9e"
        );
    }

    #[test]
    fn test_service_match_ignores_case() {
        let upper = Uuid::parse_str("6E400001-B5A3-F393-E0A9-E50E24DCCA9E").unwrap();
        let battery = Uuid::from_u128(0x0000180F_0000_1000_8000_00805F9B34FB);
        assert!(has_uart_service(&[battery, upper]));
        assert!(!has_uart_service(&[battery]));
        assert!(!has_uart_service(&[]));
    }
}

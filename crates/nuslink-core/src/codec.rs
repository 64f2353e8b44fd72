//! Text codec for the UART link
//!
//! The link is a text-oriented serial channel: outbound text is sent as its UTF-8
//! bytes, inbound notifications are read back as UTF-8.

/// Conservative write size for links that have not negotiated a larger MTU
pub const DEFAULT_WRITE_MTU: usize = 244;

/// Encoder/decoder between session text and wire payloads
#[derive(Debug, Clone, Copy, Default)]
pub struct NusCodec;

impl NusCodec {
    pub fn encode(text: &str) -> Vec<u8> {
        text.as_bytes().to_vec()
    }

    /// Decode a notification payload. Invalid sequences are replaced rather than
    /// rejected so one corrupt packet does not drop the line.
    pub fn decode(payload: &[u8]) -> String {
        String::from_utf8_lossy(payload).into_owned()
    }

    /// Split an outbound payload into writes of at most `mtu` bytes
    pub fn chunks(payload: &[u8], mtu: usize) -> impl Iterator<Item = &[u8]> {
        payload.chunks(mtu.max(1))
    }
}

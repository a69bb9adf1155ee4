//! Protocol layer: framing, device messages, specialized replies.

mod envelope;
mod message;
mod reply;

pub use envelope::{Envelope, BODY_SIZE, FRAME_SIZE, PREAMBLE};
pub use message::{
    DeviceMessage, BROADCAST, CLASS_ASSIGN, CLASS_DISCOVERY, PAYLOAD_SIZE, TAG_REQUEST,
    TAG_RESPONSE,
};
pub use reply::{DiscoveryReply, ResponseFrame, TimeoutIndicator, DISCOVERY_MARKER};

/// Format raw bytes as spaced lowercase hex, for narration and trace logs.
pub fn hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

//! Device message layer.
//!
//! A typed view over an envelope body:
//! ```text
//! ┌───────────┬───────┬──────────┬─────────┐
//! │ Direction │ Class │ Payload  │ Address │
//! │ 1 byte    │ 1 byte│ 8 bytes  │ 1 byte  │
//! └───────────┴───────┴──────────┴─────────┘
//! ```
//!
//! The direction byte is `(5<<5)+11` for requests and `(4<<5)+11` for
//! responses; any other value is a parse failure.

use std::fmt;

use super::envelope::{Envelope, BODY_SIZE, FRAME_SIZE};
use super::hex;
use crate::error::{BuswireError, Result};

/// Direction tag for requests.
pub const TAG_REQUEST: u8 = (5 << 5) + 11;

/// Direction tag for responses.
pub const TAG_RESPONSE: u8 = (4 << 5) + 11;

/// Payload size in bytes (fixed, exactly 8).
pub const PAYLOAD_SIZE: usize = 8;

/// Class code of discovery requests and replies.
pub const CLASS_DISCOVERY: u8 = 0xF0;

/// Class code of address assignment commands and of the timeout sentinel.
pub const CLASS_ASSIGN: u8 = 0xF8;

/// Broadcast address, reachable by any device in learn mode. Never a
/// valid assigned device address.
pub const BROADCAST: u8 = 0;

/// A decoded device command or response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceMessage {
    /// Organization/class byte distinguishing the payload's meaning.
    pub class_code: u8,
    /// Target (requests) or frame address field (responses). 0 is the
    /// broadcast/unassigned address.
    pub address: u8,
    /// Command payload.
    pub payload: [u8; PAYLOAD_SIZE],
    /// Direction flag.
    pub is_request: bool,
}

impl DeviceMessage {
    /// Create a request with the given class, address and payload.
    pub fn request(class_code: u8, address: u8, payload: [u8; PAYLOAD_SIZE]) -> Self {
        Self {
            class_code,
            address,
            payload,
            is_request: true,
        }
    }

    /// Discovery request probing `address` (0 probes any learn-mode device).
    pub fn discovery_request(address: u8) -> Self {
        Self::request(CLASS_DISCOVERY, address, [0u8; PAYLOAD_SIZE])
    }

    /// Assignment command offering `address` to the learn-mode device.
    pub fn assign_command(address: u8) -> Self {
        Self::request(CLASS_ASSIGN, address, [0u8; PAYLOAD_SIZE])
    }

    /// Encode into an envelope body.
    pub fn body(&self) -> [u8; BODY_SIZE] {
        let mut body = [0u8; BODY_SIZE];
        body[0] = if self.is_request {
            TAG_REQUEST
        } else {
            TAG_RESPONSE
        };
        body[1] = self.class_code;
        body[2..10].copy_from_slice(&self.payload);
        body[10] = self.address;
        body
    }

    /// Serialize to the full 14-byte wire frame.
    pub fn serialize(&self) -> [u8; FRAME_SIZE] {
        Envelope::new(self.body()).serialize()
    }

    /// Parse a wire frame into a device message.
    ///
    /// # Errors
    ///
    /// Returns [`BuswireError::Parse`] if the envelope is malformed or
    /// the direction byte is neither the request nor the response tag.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let envelope = Envelope::parse(data)?;
        Self::from_body(&envelope.body)
    }

    /// Decode an already-validated envelope body.
    pub fn from_body(body: &[u8; BODY_SIZE]) -> Result<Self> {
        let is_request = match body[0] {
            TAG_REQUEST => true,
            TAG_RESPONSE => false,
            other => {
                return Err(BuswireError::Parse(format!(
                    "unknown direction tag {other:#04x}"
                )))
            }
        };

        let mut payload = [0u8; PAYLOAD_SIZE];
        payload.copy_from_slice(&body[2..10]);

        Ok(Self {
            class_code: body[1],
            address: body[10],
            payload,
            is_request,
        })
    }
}

impl fmt::Display for DeviceMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} class {:02x} addr {:02x}, {}",
            if self.is_request { "request" } else { "response" },
            self.class_code,
            self.address,
            hex(&self.payload)
        )
    }
}

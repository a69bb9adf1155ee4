//! Envelope framing and checksum validation.
//!
//! Implements the fixed 14-byte wire frame:
//! ```text
//! ┌──────────┬──────────┬──────────────┐
//! │ Preamble │ Body     │ Checksum     │
//! │ 2 bytes  │ 11 bytes │ 1 byte       │
//! │ A5 5A    │          │ sum(body)%256│
//! └──────────┴──────────┴──────────────┘
//! ```
//!
//! The envelope has no knowledge of device semantics; it only frames and
//! checks an opaque 11-byte body.

use crate::error::{BuswireError, Result};

/// Body size in bytes (fixed, exactly 11).
pub const BODY_SIZE: usize = 11;

/// Full frame size in bytes (preamble + body + checksum).
pub const FRAME_SIZE: usize = 14;

/// Fixed two-byte preamble opening every frame.
pub const PREAMBLE: [u8; 2] = [0xA5, 0x5A];

/// A framed message body.
///
/// Constructed fresh for each outbound message or produced by parsing
/// inbound bytes; immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope {
    /// Raw message body (direction tag, class, payload, address).
    pub body: [u8; BODY_SIZE],
}

impl Envelope {
    /// Create an envelope around a raw body.
    pub fn new(body: [u8; BODY_SIZE]) -> Self {
        Self { body }
    }

    /// Serialize to the 14-byte wire form.
    pub fn serialize(&self) -> [u8; FRAME_SIZE] {
        let mut buf = [0u8; FRAME_SIZE];
        buf[..2].copy_from_slice(&PREAMBLE);
        buf[2..13].copy_from_slice(&self.body);
        buf[13] = checksum(&self.body);
        buf
    }

    /// Parse a wire frame back into an envelope.
    ///
    /// # Errors
    ///
    /// Returns [`BuswireError::Parse`] if the length is not exactly 14,
    /// the preamble does not match, or the checksum is wrong.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() != FRAME_SIZE {
            return Err(BuswireError::Parse(format!(
                "invalid frame length {} (expected {})",
                data.len(),
                FRAME_SIZE
            )));
        }
        if data[..2] != PREAMBLE {
            return Err(BuswireError::Parse("no preamble found".to_string()));
        }

        let mut body = [0u8; BODY_SIZE];
        body.copy_from_slice(&data[2..13]);

        if checksum(&body) != data[13] {
            return Err(BuswireError::Parse("checksum mismatch".to_string()));
        }

        Ok(Self { body })
    }
}

/// Sum of the body bytes mod 256.
#[inline]
fn checksum(body: &[u8]) -> u8 {
    body.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

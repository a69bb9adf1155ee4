//! Specialized response interpretations.
//!
//! A response frame from the gateway is always syntactically valid, but
//! its meaning depends on which known shape it matches: a discovery reply
//! carrying device data, or the timeout sentinel meaning "nobody
//! answered". Each shape refines [`DeviceMessage`] by pinning class code,
//! direction and frame address to fixed constants.

use std::fmt;

use super::hex;
use super::message::{DeviceMessage, CLASS_ASSIGN, CLASS_DISCOVERY, PAYLOAD_SIZE};
use crate::error::{BuswireError, Result};

/// Fixed marker bytes at payload offsets 2..4 of every discovery reply.
pub const DISCOVERY_MARKER: [u8; 2] = [0x7F, 0x08];

/// A response shape that can be decoded from a raw reply frame.
///
/// Implementations try their own fixed-field constraints on top of the
/// generic [`DeviceMessage`] decode; [`DeviceMessage`] itself is the
/// accept-anything fallback.
pub trait ResponseFrame: Sized {
    /// Refine an already-decoded device message into this shape.
    fn from_message(message: DeviceMessage) -> Result<Self>;

    /// Parse raw reply bytes into this shape.
    fn parse(data: &[u8]) -> Result<Self> {
        Self::from_message(DeviceMessage::parse(data)?)
    }
}

impl ResponseFrame for DeviceMessage {
    fn from_message(message: DeviceMessage) -> Result<Self> {
        Ok(message)
    }
}

/// A device's answer to a discovery probe or an assignment command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryReply {
    /// Address the device claims to occupy (0 while still in learn mode).
    pub reported_address: u8,
    /// Number of consecutive addresses the device occupies.
    pub reported_size: u8,
    /// Four-byte device model identifier.
    pub model: [u8; 4],
}

impl DiscoveryReply {
    /// Encode back into a response frame (used by test fixtures and the
    /// fake-bus side of the protocol).
    pub fn to_message(&self) -> DeviceMessage {
        let mut payload = [0u8; PAYLOAD_SIZE];
        payload[0] = self.reported_address;
        payload[1] = self.reported_size;
        payload[2..4].copy_from_slice(&DISCOVERY_MARKER);
        payload[4..8].copy_from_slice(&self.model);
        DeviceMessage {
            class_code: CLASS_DISCOVERY,
            address: 0,
            payload,
            is_request: false,
        }
    }
}

impl ResponseFrame for DiscoveryReply {
    fn from_message(message: DeviceMessage) -> Result<Self> {
        if message.class_code != CLASS_DISCOVERY || message.is_request || message.address != 0 {
            return Err(BuswireError::Parse("not a discovery reply".to_string()));
        }
        if message.payload[2..4] != DISCOVERY_MARKER {
            return Err(BuswireError::Parse(
                "discovery marker 7f 08 not present".to_string(),
            ));
        }

        let mut model = [0u8; 4];
        model.copy_from_slice(&message.payload[4..8]);

        Ok(Self {
            reported_address: message.payload[0],
            reported_size: message.payload[1],
            model,
        })
    }
}

impl fmt::Display for DiscoveryReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "address {} size {}, model {}",
            self.reported_address,
            self.reported_size,
            hex(&self.model)
        )
    }
}

/// The gateway's "nobody answered" sentinel.
///
/// Carries no data; the fixed frame (class `0xF8`, response direction,
/// address 0, all-zero payload) is the whole message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutIndicator;

impl TimeoutIndicator {
    /// Encode into a response frame.
    pub fn to_message(&self) -> DeviceMessage {
        DeviceMessage {
            class_code: CLASS_ASSIGN,
            address: 0,
            payload: [0u8; PAYLOAD_SIZE],
            is_request: false,
        }
    }
}

impl ResponseFrame for TimeoutIndicator {
    fn from_message(message: DeviceMessage) -> Result<Self> {
        if message.class_code != CLASS_ASSIGN
            || message.is_request
            || message.address != 0
            || message.payload != [0u8; PAYLOAD_SIZE]
        {
            return Err(BuswireError::Parse("not a timeout indicator".to_string()));
        }
        Ok(Self)
    }
}

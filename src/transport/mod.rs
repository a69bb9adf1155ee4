//! Transport module - carrying opaque frames to the bus gateway.
//!
//! The protocol layer has no opinion on how frames travel; it sends one
//! request and awaits one raw reply. [`Transport`] is that seam, and
//! [`TcpGateway`] is the concrete client used by the binary.

mod tcp;

use async_trait::async_trait;

pub use tcp::TcpGateway;

/// One opaque request/response round trip to the bus gateway.
///
/// Implementations own their endpoint, addressing, and retry policy. A
/// returned error means the channel itself failed; bus-level timeouts
/// arrive as regular reply frames and are not this layer's concern.
#[async_trait]
pub trait Transport {
    /// Send one frame and return the raw reply bytes.
    async fn request(&mut self, frame: &[u8]) -> std::io::Result<Vec<u8>>;
}

//! # buswire
//!
//! Device discovery and address assignment for a serial device bus,
//! tunneled over a request/response gateway.
//!
//! ## Architecture
//!
//! - **Protocol** ([`protocol`]): 14-byte checksummed envelope, typed
//!   device messages, and the two specialized reply shapes (discovery
//!   reply, timeout sentinel).
//! - **Transport** ([`transport`]): one opaque frame out, one raw reply
//!   back. The binary ships a TCP gateway client.
//! - **Bus** ([`Bus`]): a single round trip, turning the gateway's
//!   timeout sentinel into a typed timeout failure.
//! - **Enumerator** ([`Enumerator`]): the stateful algorithm — full bus
//!   scan into an occupancy map, then an indefinite learn-mode loop that
//!   assigns free addresses to new devices.
//!
//! ## Example
//!
//! ```ignore
//! use buswire::{Bus, Enumerator, TcpGateway};
//!
//! #[tokio::main]
//! async fn main() -> buswire::Result<()> {
//!     let gateway = TcpGateway::connect("fam-gw.local:3320").await?;
//!     let mut enumerator = Enumerator::new(Bus::new(gateway));
//!     enumerator.run().await
//! }
//! ```

pub mod enumerator;
pub mod error;
pub mod protocol;
pub mod transport;

mod bus;

pub use bus::Bus;
pub use enumerator::{Enumerator, LearnOutcome, SlotState, UsageMap};
pub use error::{BuswireError, Result};
pub use transport::{TcpGateway, Transport};
